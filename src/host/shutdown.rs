// Shutdown token - Cooperative cancellation of the frame pump
//
// Signal handlers and key sources only set the flag; the run loop notices it
// before the next run-step and tears down outside any handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "stop running" flag
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken(Arc<AtomicBool>);

impl ShutdownToken {
    /// Create a token that has not been triggered
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the frame pump to stop
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Install a SIGINT/SIGTERM handler that requests shutdown
    ///
    /// Can only be done once per process.
    pub fn install_signal_handler(&self) -> Result<(), ctrlc::Error> {
        let token = self.clone();
        ctrlc::set_handler(move || token.request())
    }
}
