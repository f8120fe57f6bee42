//! Byte transport to a running engine process.
//!
//! The controller is generic over anything implementing [`Transport`], so
//! tests can drive the protocol with a scripted transport instead of a real
//! child process.

mod process;

pub use process::ProcessTransport;

use crate::error::PipeError;

/// Capability interface over the engine's standard streams.
pub trait Transport: Send {
    /// Write `message` to the engine's stdin synchronously.
    fn send(&mut self, message: &[u8]) -> Result<(), PipeError>;

    /// Return whatever bytes are currently buffered, without blocking.
    ///
    /// `Ok(None)` means no data is available right now. The returned bytes
    /// are raw chunks with no alignment to line boundaries.
    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, PipeError>;
}
