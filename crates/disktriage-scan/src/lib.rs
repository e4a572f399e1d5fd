//! Filesystem scanning engine for disktriage.
//!
//! This crate turns a directory tree into a flat set of immutable
//! [`FileRecord`]s using parallel traversal via jwalk.
//!
//! # Overview
//!
//! - **Parallel traversal** with a bounded rayon pool
//! - **Per-entry failure recovery**: unreadable entries become skip
//!   events, the walk continues
//! - **Excluded-prefix pruning** at the read-dir boundary
//! - **Symlink-cycle protection** via visited real-path tracking
//! - **Cooperative cancellation** checked at each entry boundary
//! - **Progress updates** via a broadcast channel
//!
//! # Example
//!
//! ```rust,no_run
//! use disktriage_core::CancelFlag;
//! use disktriage_scan::{ScanConfig, Walker};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let walker = Walker::new();
//! let outcome = walker.scan(&config, &CancelFlag::new()).unwrap();
//!
//! println!("{} files, {} bytes", outcome.total_files(), outcome.total_size());
//! for skip in &outcome.skips {
//!     eprintln!("skipped {}: {}", skip.path.display(), skip.message);
//! }
//! ```
//!
//! # Progress Monitoring
//!
//! Subscribe before starting the scan:
//!
//! ```rust,no_run
//! use disktriage_scan::Walker;
//!
//! let walker = Walker::new();
//! let mut progress_rx = walker.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("scanned {} files", progress.files_scanned);
//!     }
//! });
//! ```

mod progress;
mod visited;
mod walker;

pub use progress::ScanProgress;
pub use visited::VisitedTracker;
pub use walker::Walker;

// Re-export core types for convenience
pub use disktriage_core::{
    CancelFlag, FileRecord, RecordKind, ScanConfig, ScanError, ScanOutcome, ScanStats, ScanStatus,
    SkipEvent, SkipKind, Timestamps,
};
