//! Local stand-in for `tokio_util::sync::CancellationToken` (§5
//! "Cancellation"): the core is synchronous and doesn't otherwise depend
//! on tokio, so a tiny atomic flag does the job instead of pulling in an
//! async runtime for one type.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
