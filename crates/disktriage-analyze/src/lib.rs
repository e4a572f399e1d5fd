//! Analysis algorithms for disktriage.
//!
//! This crate consumes the flat record set produced by `disktriage-scan`
//! and derives views from it:
//!
//! - **Filtering** - conjunctive predicates over records, order-preserving
//! - **Duplicate detection** - exact-content duplicates via staged hashing
//! - **Smart analysis** - heuristic reclaimable-space candidates
//!
//! All three consumers run over the same record set independently; the
//! walker never re-runs for them.
//!
//! # Duplicate Detection
//!
//! Uses a three-phase algorithm so full-file hashing is bounded to files
//! that survive the cheaper tests:
//!
//! 1. Group files by size (instant)
//! 2. Compute partial hash (first + last 4 KiB) for size-matched files
//! 3. Compute full BLAKE3 hash for partial-hash matches
//!
//! ```rust,ignore
//! use disktriage_analyze::DuplicateFinder;
//! use disktriage_core::CancelFlag;
//!
//! let finder = DuplicateFinder::new();
//! let report = finder.find_duplicates(&outcome.records, &CancelFlag::new());
//! println!("{} groups, {} bytes wasted", report.group_count, report.total_wasted_space);
//! ```
//!
//! # Smart Analysis
//!
//! A declarative table of heuristic rules flags reclaim candidates; the
//! engine never mutates anything, candidates are advisory only:
//!
//! ```rust,ignore
//! use disktriage_analyze::SmartAnalyzer;
//! use disktriage_core::CancelFlag;
//!
//! let report = SmartAnalyzer::new().analyze(&outcome.records, &CancelFlag::new());
//! for candidate in &report.candidates {
//!     println!("{}: {} ({} bytes)", candidate.reason, candidate.path.display(),
//!         candidate.reclaimable_bytes);
//! }
//! ```

mod duplicates;
mod filter;
mod smart;

pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicateReport,
};
pub use filter::{
    FileFilter, FilterConfig, FilterConfigBuilder, SortKey, sort_records, staleness_score,
};
pub use smart::{
    ReclaimCandidate, ReclaimReason, SmartAnalyzer, SmartConfig, SmartConfigBuilder, SmartReport,
    empty_folders,
};

// Re-export core types
pub use disktriage_core::{CancelFlag, Category, ContentHash, FileRecord, ScanStatus, SkipEvent};
