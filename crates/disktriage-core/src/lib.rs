//! Core types for disktriage.
//!
//! This crate provides the fundamental data structures shared by the
//! scanning and analysis crates: file records, the category table,
//! scan configuration, the error taxonomy, and cooperative cancellation.

mod cancel;
mod category;
mod config;
mod error;
mod outcome;
mod record;

pub use cancel::{CancelFlag, ScanStatus};
pub use category::{Category, assign_categories, categorize, categorize_extension};
pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, SkipEvent, SkipKind};
pub use outcome::{ScanOutcome, ScanStats};
pub use record::{ContentHash, FileRecord, RecordKind, Timestamps};
