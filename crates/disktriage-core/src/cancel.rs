//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// How a pass ended. Cancellation is a normal termination mode carrying
/// partial results, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStatus {
    Completed,
    Cancelled,
}

impl ScanStatus {
    /// Check if this status marks a cancelled run.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanStatus::Cancelled)
    }
}

/// Shared cancellation flag.
///
/// Clones share the same underlying flag. Workers check it at each
/// directory-entry boundary and each hashing-chunk boundary; once set,
/// in-flight work stops promptly and the run is over; no restart.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Status for a pass that ran to this point.
    pub fn status(&self) -> ScanStatus {
        if self.is_cancelled() {
            ScanStatus::Cancelled
        } else {
            ScanStatus::Completed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_shared_across_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        assert_eq!(flag.status(), ScanStatus::Completed);

        flag.cancel();
        assert!(clone.is_cancelled());
        assert_eq!(clone.status(), ScanStatus::Cancelled);
    }
}
