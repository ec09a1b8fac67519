use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag for one playback job.
///
/// The round loop keeps one clone and hands the other to the job when it
/// starts. The job polls it before every mark and every feedback step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the job to stop at its next check. Safe to call repeatedly.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_and_idempotent() {
        let token = CancelToken::new();
        let job_side = token.clone();
        assert!(!job_side.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(job_side.is_cancelled());
        assert!(!CancelToken::new().is_cancelled());
    }
}
