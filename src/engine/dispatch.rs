//! Per-line protocol dispatch.
//!
//! Every complete line from the engine lands here exactly once, whether it
//! was read by a foreground poll or by the background reader thread. The
//! caller holds the model lock for the duration of a single line.

use log::{debug, warn};

use super::BestContinuation;
use crate::moves::LongMove;
use crate::options::{EngineOption, OptionRegistry};
use crate::parser::TokenParser;
use crate::sync::{Lifecycle, LifecycleCell};

/// Everything the dispatcher learns about the engine.
#[derive(Debug, Default)]
pub(crate) struct Model {
    pub name: String,
    pub author: String,
    pub options: OptionRegistry,
    pub best: BestContinuation,
}

/// Apply one complete line of engine output to the model.
///
/// Returns a snapshot of the best continuation when the line replaced it,
/// so the caller can notify listeners after releasing the model lock.
pub(crate) fn dispatch_line(
    model: &mut Model,
    state: &LifecycleCell,
    line: &str,
) -> Option<BestContinuation> {
    let mut parser = TokenParser::new(line);
    let command = parser.next_token()?;

    match command {
        "uciok" => state.set(Lifecycle::Ready),
        "id" => match parser.next_token() {
            Some("name") => model.name = parser.rest_of_line().to_string(),
            Some("author") => model.author = parser.rest_of_line().to_string(),
            _ => debug!("ignoring id line: {line}"),
        },
        "option" => {
            // option declarations are only honored during the handshake
            if !state.is(Lifecycle::Uninitialized) {
                warn!("engine declared an option after the handshake: {line}");
                return None;
            }
            match EngineOption::parse(&mut parser, line) {
                Ok(Some(option)) => model.options.push(option),
                Ok(None) => debug!("skipping option with unknown type: {line}"),
                Err(e) => warn!("malformed option declaration: {e}"),
            }
        }
        "info" => return dispatch_info(model, &mut parser, line),
        "bestmove" => {
            parser.next_token();
            model.best.ponder_move = None;
            if parser.jump_past("ponder") {
                model.best.ponder_move = parser.next_typed::<LongMove>();
            }
        }
        _ => debug!("ignoring engine command: {command}"),
    }
    None
}

/// Scan an `info` line for the fields the model tracks.
///
/// Fields may appear in any order and are applied to the model as they are
/// consumed; `pv` (like `string` and `refutation`) runs to the end of the
/// line. The continuation list itself is replaced atomically: if any move
/// in the variation fails to parse, the previous list stands.
fn dispatch_info(
    model: &mut Model,
    parser: &mut TokenParser<'_>,
    line: &str,
) -> Option<BestContinuation> {
    while let Some(token) = parser.next_token() {
        match token {
            "depth" => {
                if let Some(depth) = parser.next_typed() {
                    model.best.depth = depth;
                }
            }
            "cp" => {
                if let Some(score) = parser.next_typed() {
                    model.best.score = score;
                    model.best.mate = false;
                }
            }
            "mate" => {
                if let Some(score) = parser.next_typed() {
                    model.best.score = score;
                    model.best.mate = true;
                }
            }
            "pv" => {
                let mut continuation = Vec::new();
                while let Some(notation) = parser.next_token() {
                    match notation.parse() {
                        Ok(mv) => continuation.push(mv),
                        Err(e) => {
                            warn!("unparseable move {notation:?} in line {line:?}: {e}");
                            return None;
                        }
                    }
                }
                model.best.continuation = continuation;
                return Some(model.best.clone());
            }
            // free-text fields swallow everything after them
            "string" | "refutation" => {
                parser.rest_of_line();
                return None;
            }
            _ => {}
        }
    }
    None
}
