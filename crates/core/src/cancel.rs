//! Cooperative cancellation for generation runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Error;

/// Cheaply clonable cancellation flag checked at stage boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Bail out of `stage` if cancellation was requested.
    pub fn check(&self, stage: &str) -> Result<(), Error> {
        if self.is_cancelled() {
            return Err(Error::Cancelled { stage: stage.to_string() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        assert!(observer.check("blueprint").is_ok());
        signal.cancel();
        assert!(observer.is_cancelled());
        let err = observer.check("modules").unwrap_err();
        assert!(err.to_string().contains("modules"));
    }
}
