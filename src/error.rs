//! Error types for the engine client.

use std::fmt;
use std::io;

/// Error type for transport-level pipe failures
#[derive(Debug)]
pub enum PipeError {
    /// The engine closed its end of the pipe (process exited)
    Closed,
    /// An I/O error occurred while reading or writing the pipe
    Io(io::Error),
}

impl fmt::Display for PipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeError::Closed => write!(f, "engine pipe closed"),
            PipeError::Io(e) => write!(f, "engine pipe I/O error: {e}"),
        }
    }
}

impl std::error::Error for PipeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipeError::Closed => None,
            PipeError::Io(e) => Some(e),
        }
    }
}

/// Error type for engine controller operations
#[derive(Debug)]
pub enum EngineError {
    /// The engine process could not be spawned
    Creation(io::Error),
    /// A read or write on the engine pipes failed after creation
    Pipe(PipeError),
    /// A search was requested before the handshake completed
    NotReady,
    /// The engine did not answer `uci` with `uciok` before the deadline
    HandshakeTimeout { waited_ms: u64 },
    /// An `option` declaration was missing its `type` token
    InvalidOption { line: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Creation(e) => write!(f, "failed to spawn engine process: {e}"),
            EngineError::Pipe(e) => write!(f, "{e}"),
            EngineError::NotReady => write!(f, "engine is not ready"),
            EngineError::HandshakeTimeout { waited_ms } => {
                write!(f, "engine did not complete the handshake within {waited_ms}ms")
            }
            EngineError::InvalidOption { line } => {
                write!(f, "malformed option declaration: {line:?}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Creation(e) => Some(e),
            EngineError::Pipe(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PipeError> for EngineError {
    fn from(e: PipeError) -> Self {
        EngineError::Pipe(e)
    }
}
