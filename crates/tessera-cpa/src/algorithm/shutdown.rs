use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a host and a running
/// algorithm.
///
/// The algorithm polls it before every expansion and before every edge; it
/// never interrupts an analysis in the middle of a call.
#[derive(Debug, Clone, Default)]
pub struct ShutdownNotifier {
    requested: Arc<AtomicBool>,
}

impl ShutdownNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Withdraw a request so the algorithm can be resumed.
    pub fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}
