//! Heuristic reclaimable-space analysis.
//!
//! Rules are a declarative table of (reason, predicate) pairs evaluated
//! uniformly over the record set, so each rule is independently testable
//! and order-free. A record qualifying under several reasons is reported
//! once per matching reason. Candidates are advisory only; the engine
//! never mutates the filesystem.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

use disktriage_core::{CancelFlag, FileRecord, ScanStatus};

/// How many records are checked between cancellation polls.
const CANCEL_EVERY: usize = 512;

/// Why a path was flagged as reclaimable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ReclaimReason {
    TempFile,
    StaleDownload,
    OversizedFolder,
}

/// A record or folder aggregate flagged by a heuristic rule.
///
/// Advisory metadata for a human or downstream tool; nothing here is ever
/// acted on by the engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReclaimCandidate {
    /// Flagged path.
    pub path: PathBuf,

    /// Which rule matched.
    pub reason: ReclaimReason,

    /// Bytes this candidate would free (aggregate size for folders).
    pub reclaimable_bytes: u64,

    /// Heuristic confidence in [0, 1].
    pub confidence: f32,
}

/// Configuration for smart analysis.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct SmartConfig {
    /// Reference time for age calculations (default: now).
    #[builder(default = "SystemTime::now()")]
    pub reference_time: SystemTime,

    /// Lower-cased fragments marking temp/cache locations anywhere in a
    /// path.
    #[builder(default = "SmartConfigBuilder::default_temp_patterns()")]
    pub temp_patterns: Vec<String>,

    /// Lower-cased extensions (no dot) of temporary files.
    #[builder(default = "SmartConfigBuilder::default_temp_extensions()")]
    pub temp_extensions: Vec<String>,

    /// Lower-cased fragments marking download locations.
    #[builder(default = "vec![\"downloads\".to_string()]")]
    pub download_markers: Vec<String>,

    /// How long a download must sit unaccessed before it is stale.
    #[builder(default = "Duration::from_secs(90 * 24 * 60 * 60)")]
    pub stale_after: Duration,

    /// Minimum aggregate size for a folder to be flagged oversized.
    #[builder(default = "1024 * 1024 * 1024")]
    pub oversized_min_bytes: u64,
}

impl SmartConfigBuilder {
    fn default_temp_patterns() -> Vec<String> {
        [
            "temp",
            "tmp",
            "cache",
            "caches",
            ".cache",
            "temporary",
            "__pycache__",
            "node_modules",
            ".npm",
            ".yarn",
            ".nuget",
            "thumbs.db",
            "desktop.ini",
            ".ds_store",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn default_temp_extensions() -> Vec<String> {
        [
            "tmp", "temp", "bak", "old", "orig", "log", "dmp", "crash", "swp", "swo",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

impl Default for SmartConfig {
    fn default() -> Self {
        Self {
            reference_time: SystemTime::now(),
            temp_patterns: SmartConfigBuilder::default_temp_patterns(),
            temp_extensions: SmartConfigBuilder::default_temp_extensions(),
            download_markers: vec!["downloads".to_string()],
            stale_after: Duration::from_secs(90 * 24 * 60 * 60),
            oversized_min_bytes: 1024 * 1024 * 1024,
        }
    }
}

impl SmartConfig {
    /// Create a new config builder.
    pub fn builder() -> SmartConfigBuilder {
        SmartConfigBuilder::default()
    }
}

/// Results from a smart analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartReport {
    /// Candidates sorted by reclaimable bytes descending.
    pub candidates: Vec<ReclaimCandidate>,

    /// Whether the pass completed or was cancelled part-way.
    pub status: ScanStatus,

    /// Bytes flagged as temp files.
    pub temp_bytes: u64,

    /// Bytes flagged as stale downloads.
    pub stale_download_bytes: u64,

    /// Sum of the file-level reasons. Folder aggregates are excluded so
    /// overlapping candidates are not double-counted.
    pub potential_savings: u64,
}

impl SmartReport {
    /// Candidates flagged for one reason.
    pub fn with_reason(&self, reason: ReclaimReason) -> impl Iterator<Item = &ReclaimCandidate> {
        self.candidates.iter().filter(move |c| c.reason == reason)
    }

    /// Check if any candidates were found.
    pub fn has_candidates(&self) -> bool {
        !self.candidates.is_empty()
    }
}

/// A file-level heuristic rule: returns the confidence when it matches.
type FileRule = fn(&SmartConfig, &FileRecord) -> Option<f32>;

/// The rule table. Each rule is independent; evaluation order does not
/// matter and a file may match several.
const FILE_RULES: &[(ReclaimReason, FileRule)] = &[
    (ReclaimReason::TempFile, temp_file_rule),
    (ReclaimReason::StaleDownload, stale_download_rule),
];

fn temp_file_rule(config: &SmartConfig, record: &FileRecord) -> Option<f32> {
    if config
        .temp_extensions
        .iter()
        .any(|ext| record.extension == ext.as_str())
    {
        // Extension is the strongest temp signal.
        return Some(0.9);
    }
    let path = record.path.to_string_lossy().to_lowercase();
    if config.temp_patterns.iter().any(|p| path.contains(p)) {
        return Some(0.75);
    }
    None
}

fn stale_download_rule(config: &SmartConfig, record: &FileRecord) -> Option<f32> {
    let path = record.path.to_string_lossy().to_lowercase();
    if !config.download_markers.iter().any(|m| path.contains(m)) {
        return None;
    }
    // Missing timestamps fail closed: never flagged stale.
    let stamp = record.timestamps.best_access()?;
    let age = config
        .reference_time
        .duration_since(stamp)
        .unwrap_or(Duration::ZERO);
    (age >= config.stale_after).then_some(0.6)
}

/// Heuristic reclaimable-space analyzer.
pub struct SmartAnalyzer {
    config: SmartConfig,
}

impl SmartAnalyzer {
    /// Create a new analyzer with default config.
    pub fn new() -> Self {
        Self {
            config: SmartConfig::default(),
        }
    }

    /// Create a new analyzer with custom config.
    pub fn with_config(config: SmartConfig) -> Self {
        Self { config }
    }

    /// Evaluate every rule over the record set.
    ///
    /// A cancelled pass returns the candidates found so far with
    /// [`ScanStatus::Cancelled`].
    pub fn analyze(&self, records: &[FileRecord], cancel: &CancelFlag) -> SmartReport {
        let mut candidates = Vec::new();
        let mut status = ScanStatus::Completed;

        for (i, record) in records.iter().enumerate() {
            if i % CANCEL_EVERY == 0 && cancel.is_cancelled() {
                status = ScanStatus::Cancelled;
                break;
            }

            if record.is_file() {
                for (reason, rule) in FILE_RULES {
                    if let Some(confidence) = rule(&self.config, record) {
                        candidates.push(ReclaimCandidate {
                            path: record.path.clone(),
                            reason: *reason,
                            reclaimable_bytes: record.size,
                            confidence,
                        });
                    }
                }
            } else if record.size >= self.config.oversized_min_bytes {
                candidates.push(ReclaimCandidate {
                    path: record.path.clone(),
                    reason: ReclaimReason::OversizedFolder,
                    reclaimable_bytes: record.size,
                    confidence: 0.3,
                });
            }
        }

        candidates.sort_by(|a, b| {
            b.reclaimable_bytes
                .cmp(&a.reclaimable_bytes)
                .then_with(|| a.path.cmp(&b.path))
        });

        let temp_bytes = sum_reason(&candidates, ReclaimReason::TempFile);
        let stale_download_bytes = sum_reason(&candidates, ReclaimReason::StaleDownload);
        debug!(
            candidates = candidates.len(),
            temp_bytes, stale_download_bytes, "smart analysis finished"
        );

        SmartReport {
            candidates,
            status,
            temp_bytes,
            stale_download_bytes,
            potential_savings: temp_bytes + stale_download_bytes,
        }
    }
}

impl Default for SmartAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_reason(candidates: &[ReclaimCandidate], reason: ReclaimReason) -> u64 {
    candidates
        .iter()
        .filter(|c| c.reason == reason)
        .map(|c| c.reclaimable_bytes)
        .sum()
}

/// Directories whose subtree contains no files at all.
pub fn empty_folders(records: &[FileRecord]) -> Vec<PathBuf> {
    let mut folders: Vec<PathBuf> = records
        .iter()
        .filter(|r| r.is_dir() && r.file_count() == 0)
        .map(|r| r.path.clone())
        .collect();
    folders.sort();
    folders
}
