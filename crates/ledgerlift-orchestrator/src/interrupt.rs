//! Cooperative interruption

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop request, polled at record and table boundaries
///
/// Cloning shares the flag, so a signal handler can hold one clone while the
/// orchestrator polls another.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// A flag that is not set
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the request before another run
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
