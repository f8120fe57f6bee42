//! Shared lifecycle state for the engine connection.
//!
//! The foreground caller and the background reader both observe and advance
//! the lifecycle, so it lives in an atomic cell shared between them.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of an engine connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Process spawned, capability handshake not yet completed
    Uninitialized,
    /// Handshake completed, no search active
    Ready,
    /// A search is active and the reader thread is live
    Running,
}

impl Lifecycle {
    const fn as_u8(self) -> u8 {
        match self {
            Lifecycle::Uninitialized => 0,
            Lifecycle::Ready => 1,
            Lifecycle::Running => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Lifecycle::Ready,
            2 => Lifecycle::Running,
            _ => Lifecycle::Uninitialized,
        }
    }
}

/// A thread-safe cell holding the current [`Lifecycle`].
#[derive(Clone, Debug)]
pub struct LifecycleCell(Arc<AtomicU8>);

impl LifecycleCell {
    /// Create a new cell in the `Uninitialized` state.
    #[must_use]
    pub fn new() -> Self {
        LifecycleCell(Arc::new(AtomicU8::new(Lifecycle::Uninitialized.as_u8())))
    }

    /// Read the current state.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Lifecycle {
        Lifecycle::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Advance to `state`.
    #[inline]
    pub fn set(&self, state: Lifecycle) {
        self.0.store(state.as_u8(), Ordering::Release);
    }

    /// Check whether the cell currently holds `state`.
    #[inline]
    #[must_use]
    pub fn is(&self, state: Lifecycle) -> bool {
        self.get() == state
    }
}

impl Default for LifecycleCell {
    fn default() -> Self {
        Self::new()
    }
}
