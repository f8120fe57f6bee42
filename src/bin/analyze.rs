//! Interactive analysis demo: point an engine at a position and stream its
//! best line until the user presses enter.

use std::env;
use std::io::{self, BufRead};
use std::process::ExitCode;

use uci_client::{Engine, EngineError};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: analyze <engine-path> [fen]");
        return ExitCode::FAILURE;
    };
    let fen = args.get(2).map_or(START_FEN, String::as_str);

    match analyze(path, fen) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn analyze(path: &str, fen: &str) -> Result<(), EngineError> {
    let mut engine = Engine::create(path)?;
    engine.init()?;
    print!("{}", engine.summary());

    engine.set_update_callback(|best| {
        let score = if best.mate {
            format!("mate {}", best.score)
        } else {
            format!("cp {}", best.score)
        };
        let pv: Vec<String> = best.continuation.iter().map(ToString::to_string).collect();
        println!("depth {:2} {score:>9}  {}", best.depth, pv.join(" "));
    });

    engine.set_position(fen)?;
    engine.run()?;

    println!("analyzing; press enter to stop");
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);

    engine.stop()?;
    if let Some(e) = engine.take_pending_error() {
        return Err(e);
    }

    let best = engine.best_continuation();
    if let Some(mv) = best.continuation.first() {
        println!("best move: {mv}");
    }
    Ok(())
}
