//! Visited-directory tracking for symlink cycle protection.

use std::path::{Path, PathBuf};

use dashmap::DashSet;

/// Tracks the canonical real paths of directories already entered.
///
/// When symlink following is enabled, a cyclic structure (a link pointing
/// back into an ancestor) would otherwise never terminate. The tracker
/// keeps a concurrent set of canonicalized directory paths; a directory is
/// only descended the first time its real path is seen.
#[derive(Debug, Default)]
pub struct VisitedTracker {
    seen: DashSet<PathBuf>,
}

impl VisitedTracker {
    /// Create a new tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Track a real path. Returns `true` if this is the first time seeing it.
    pub fn track(&self, real_path: PathBuf) -> bool {
        self.seen.insert(real_path)
    }

    /// Resolve a directory to its real path and track it.
    ///
    /// Returns `false` when the real path was already visited (a cycle) or
    /// cannot be resolved; callers must not descend in either case.
    pub fn enter_dir(&self, path: &Path) -> bool {
        match std::fs::canonicalize(path) {
            Ok(real) => self.track(real),
            Err(_) => false,
        }
    }

    /// Check if a real path has been seen (without tracking).
    pub fn has_seen(&self, real_path: &Path) -> bool {
        self.seen.contains(real_path)
    }

    /// Number of unique real paths tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if no paths have been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
