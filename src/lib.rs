//! Client library for UCI chess engines.
//!
//! Spawns an engine executable, runs the capability handshake, and tracks
//! the engine's analysis of a position while a search runs in the
//! background. The protocol layer is split from process management, so the
//! whole protocol surface is testable against a scripted transport.
//!
//! ```no_run
//! use uci_client::Engine;
//!
//! # fn main() -> Result<(), uci_client::EngineError> {
//! let mut engine = Engine::create("/usr/bin/stockfish")?;
//! engine.init()?;
//! println!("connected to {} by {}", engine.name(), engine.author());
//!
//! engine.set_position("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 4 3")?;
//! engine.run()?;
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! engine.stop()?;
//!
//! let best = engine.best_continuation();
//! println!("depth {}: {:?}", best.depth, best.continuation);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod moves;
pub mod options;
pub mod parser;
pub mod sync;
pub mod transport;

pub use engine::{BestContinuation, Engine, UpdateCallback};
pub use error::{EngineError, PipeError};
pub use moves::{LongMove, MoveParseError, Promotion, Square};
pub use options::{EngineOption, OptionKind, OptionRegistry, OptionValue};
pub use transport::{ProcessTransport, Transport};
