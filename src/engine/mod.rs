//! Engine controller: spawns the transport, owns the background reader
//! thread, and surfaces the engine's best line to the caller.

mod controller;
mod dispatch;

pub use controller::Engine;

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::moves::LongMove;

/// The engine's currently best-evaluated line for the active position.
///
/// Replaced wholesale on every decoded `info ... pv ...` line; valid only
/// while a search is running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BestContinuation {
    /// Principal variation from the current position
    pub continuation: Vec<LongMove>,
    /// Expected opponent reply, from the engine's last `bestmove` line
    pub ponder_move: Option<LongMove>,
    /// Search depth that produced this line
    pub depth: i32,
    /// Score in centipawns, or moves-to-mate when `mate` is set
    pub score: i32,
    /// Whether `score` is a mate distance rather than centipawns
    pub mate: bool,
}

/// Callback invoked whenever the engine publishes a new best continuation.
pub type UpdateCallback = Arc<dyn Fn(&BestContinuation) + Send + Sync>;
