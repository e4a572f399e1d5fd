//! Duplicate file detection using content hashing.
//!
//! Uses a three-phase algorithm so full-file hashing is bounded to files
//! that survive the cheaper tests:
//! 1. Group files by size (instant, O(n))
//! 2. Compute partial hash for size-matched files (first + last 4 KiB)
//! 3. Compute full BLAKE3 hash for partial-hash matches
//!
//! A file that vanishes or becomes unreadable between phases is dropped
//! from its bucket and recorded as a skip event; one bad file never aborts
//! the pass.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use disktriage_core::{CancelFlag, ContentHash, FileRecord, ScanStatus, SkipEvent};

/// Files above this size are hashed through a memory map.
const MMAP_THRESHOLD: u64 = 128 * 1024;

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DuplicateConfig {
    /// Minimum file size to consider (empty files are never candidates).
    #[builder(default = "1")]
    pub min_size: u64,

    /// Maximum file size to consider (skip huge files).
    #[builder(default = "u64::MAX")]
    pub max_size: u64,

    /// Use the partial-hash phase before full hashing.
    #[builder(default = "true")]
    pub quick_compare: bool,

    /// Number of bytes for the partial hash from the start of the file.
    #[builder(default = "4096")]
    pub partial_hash_head: usize,

    /// Number of bytes for the partial hash from the end of the file.
    #[builder(default = "4096")]
    pub partial_hash_tail: usize,

    /// Glob patterns excluding paths from duplicate detection.
    #[builder(default)]
    pub exclude_patterns: Vec<String>,

    /// Maximum number of groups to return (0 = unlimited).
    #[builder(default = "0")]
    pub max_groups: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: u64::MAX,
            quick_compare: true,
            partial_hash_head: 4096,
            partial_hash_tail: 4096,
            exclude_patterns: Vec::new(),
            max_groups: 0,
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }
}

/// A group of byte-identical files.
///
/// All members share the same size and the same full-content hash; a group
/// with fewer than two members is never reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by all files in this group.
    pub hash: ContentHash,

    /// Size of each file in bytes.
    pub size: u64,

    /// Paths to all duplicate files.
    pub paths: Vec<PathBuf>,

    /// Wasted space: size * (count - 1).
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Number of files in the group.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// Keeping one file, how many could be removed.
    pub fn deletable_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }
}

/// Results from a duplicate-finding pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups of duplicate files, sorted by wasted space descending.
    pub groups: Vec<DuplicateGroup>,

    /// Files that became unreadable during the pass.
    pub skips: Vec<SkipEvent>,

    /// Whether the pass completed or was cancelled part-way.
    pub status: ScanStatus,

    /// Total size of all duplicate files.
    pub total_duplicate_size: u64,

    /// Total space that could be reclaimed keeping one copy per group.
    pub total_wasted_space: u64,

    /// Number of files considered.
    pub files_analyzed: u64,

    /// Number of files that have duplicates.
    pub files_with_duplicates: u64,

    /// Number of duplicate groups.
    pub group_count: usize,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Total number of duplicate files across all groups.
    pub fn total_duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len()).sum()
    }
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
}

impl DuplicateFinder {
    /// Create a new finder with default config.
    pub fn new() -> Self {
        Self {
            config: DuplicateConfig::default(),
        }
    }

    /// Create a new finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Find exact-content duplicates in a record set.
    ///
    /// Directories are excluded up front. A cancelled pass returns the
    /// groups resolved so far with [`ScanStatus::Cancelled`].
    pub fn find_duplicates(&self, records: &[FileRecord], cancel: &CancelFlag) -> DuplicateReport {
        let exclude = self.exclude_set();

        // Phase 1: bucket candidate files by exact size. A unique size
        // cannot have a content duplicate.
        let mut by_size: HashMap<u64, Vec<&FileRecord>> = HashMap::new();
        let mut files_analyzed = 0u64;
        for record in records {
            if !record.is_file() || record.size < self.config.min_size.max(1) {
                continue;
            }
            if record.size > self.config.max_size {
                continue;
            }
            if exclude.is_match(&record.path) {
                continue;
            }
            files_analyzed += 1;
            by_size.entry(record.size).or_default().push(record);
        }
        by_size.retain(|_, bucket| bucket.len() > 1);
        debug!(
            files = files_analyzed,
            size_buckets = by_size.len(),
            "duplicate candidates bucketed by size"
        );

        // Phases 2+3 run per bucket, buckets in parallel.
        let resolved: Vec<(Vec<DuplicateGroup>, Vec<SkipEvent>)> = by_size
            .into_par_iter()
            .map(|(size, bucket)| self.resolve_size_bucket(size, bucket, cancel))
            .collect();

        let mut groups = Vec::new();
        let mut skips = Vec::new();
        for (bucket_groups, bucket_skips) in resolved {
            groups.extend(bucket_groups);
            skips.extend(bucket_skips);
        }

        // Deterministic output: biggest waste first, ties by first path.
        groups.sort_by(|a, b| {
            b.wasted_bytes
                .cmp(&a.wasted_bytes)
                .then_with(|| a.paths.cmp(&b.paths))
        });
        if self.config.max_groups > 0 && groups.len() > self.config.max_groups {
            groups.truncate(self.config.max_groups);
        }

        let total_duplicate_size: u64 = groups.iter().map(|g| g.size * g.paths.len() as u64).sum();
        let total_wasted_space: u64 = groups.iter().map(|g| g.wasted_bytes).sum();
        let files_with_duplicates: u64 = groups.iter().map(|g| g.paths.len() as u64).sum();
        let group_count = groups.len();

        DuplicateReport {
            groups,
            skips,
            status: cancel.status(),
            total_duplicate_size,
            total_wasted_space,
            files_analyzed,
            files_with_duplicates,
            group_count,
        }
    }

    /// Phases 2 and 3 for one size bucket.
    fn resolve_size_bucket(
        &self,
        size: u64,
        bucket: Vec<&FileRecord>,
        cancel: &CancelFlag,
    ) -> (Vec<DuplicateGroup>, Vec<SkipEvent>) {
        let mut skips = Vec::new();
        if cancel.is_cancelled() {
            return (Vec::new(), skips);
        }

        // Phase 2: partial fingerprints prune most same-size files without
        // reading them in full.
        let partial_buckets: Vec<Vec<&FileRecord>> = if self.config.quick_compare {
            let mut by_fingerprint: HashMap<[u8; 32], Vec<&FileRecord>> = HashMap::new();
            for record in bucket {
                if cancel.is_cancelled() {
                    return (Vec::new(), skips);
                }
                match self.partial_fingerprint(&record.path) {
                    Ok(fp) => by_fingerprint.entry(fp).or_default().push(record),
                    Err(skip) => {
                        warn!(path = %skip.path.display(), "dropped from bucket: {}", skip.message);
                        skips.push(skip);
                    }
                }
            }
            by_fingerprint
                .into_values()
                .filter(|candidates| candidates.len() > 1)
                .collect()
        } else {
            vec![bucket]
        };

        // Phase 3: full content hash establishes identity.
        let mut groups = Vec::new();
        for candidates in partial_buckets {
            let mut by_hash: HashMap<ContentHash, Vec<PathBuf>> = HashMap::new();
            for record in candidates {
                if cancel.is_cancelled() {
                    break;
                }
                match self.full_hash(&record.path, cancel) {
                    Ok(Some(hash)) => by_hash.entry(hash).or_default().push(record.path.clone()),
                    Ok(None) => break, // cancelled mid-file
                    Err(skip) => {
                        warn!(path = %skip.path.display(), "dropped from bucket: {}", skip.message);
                        skips.push(skip);
                    }
                }
            }

            for (hash, mut paths) in by_hash {
                if paths.len() < 2 {
                    continue;
                }
                paths.sort();
                let wasted_bytes = size * (paths.len() as u64 - 1);
                groups.push(DuplicateGroup {
                    hash,
                    size,
                    paths,
                    wasted_bytes,
                });
            }
        }

        (groups, skips)
    }

    /// Cheap fingerprint: first and last window plus the length.
    fn partial_fingerprint(&self, path: &Path) -> Result<[u8; 32], SkipEvent> {
        let run = || -> std::io::Result<[u8; 32]> {
            let mut file = File::open(path)?;
            let file_size = file.metadata()?.len();

            let mut hasher = Hasher::new();

            let head_size = (self.config.partial_hash_head as u64).min(file_size);
            let mut head = vec![0u8; head_size as usize];
            file.read_exact(&mut head)?;
            hasher.update(&head);

            if file_size > head_size {
                let tail_size = (self.config.partial_hash_tail as u64).min(file_size - head_size);
                if tail_size > 0 {
                    file.seek(SeekFrom::End(-(tail_size as i64)))?;
                    let mut tail = vec![0u8; tail_size as usize];
                    file.read_exact(&mut tail)?;
                    hasher.update(&tail);
                }
            }

            // Length distinguishes files sharing head and tail windows.
            hasher.update(&file_size.to_le_bytes());
            Ok(*hasher.finalize().as_bytes())
        };
        run().map_err(|e| SkipEvent::hash_read(path, &e))
    }

    /// Full BLAKE3 hash of a file.
    ///
    /// Returns `Ok(None)` when cancellation interrupted the read.
    fn full_hash(&self, path: &Path, cancel: &CancelFlag) -> Result<Option<ContentHash>, SkipEvent> {
        let run = || -> std::io::Result<Option<ContentHash>> {
            let mut file = File::open(path)?;
            let file_size = file.metadata()?.len();

            if file_size > MMAP_THRESHOLD {
                // Memory-mapped hashing for large files.
                let mut hasher = Hasher::new();
                hasher.update_mmap(path)?;
                return Ok(Some(ContentHash::new(*hasher.finalize().as_bytes())));
            }

            let mut hasher = Hasher::new();
            let mut buffer = vec![0u8; 64 * 1024];
            loop {
                // Chunk boundary: the cancellation point while hashing.
                if cancel.is_cancelled() {
                    return Ok(None);
                }
                let bytes_read = file.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            Ok(Some(ContentHash::new(*hasher.finalize().as_bytes())))
        };
        run().map_err(|e| SkipEvent::hash_read(path, &e))
    }

    /// Compile the exclusion patterns; invalid patterns are dropped with a
    /// warning rather than failing the pass.
    fn exclude_set(&self) -> GlobSet {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.config.exclude_patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!(pattern, "ignoring bad exclude pattern: {e}"),
            }
        }
        builder.build().unwrap_or_else(|e| {
            warn!("exclude set failed to compile: {e}");
            GlobSet::empty()
        })
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disktriage_core::Timestamps;
    use std::fs;
    use tempfile::TempDir;

    fn record_for(path: &Path) -> FileRecord {
        let size = fs::metadata(path).unwrap().len();
        FileRecord::new_file(path, size, Timestamps::default())
    }

    fn create_test_files() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("file1.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file2.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file3.txt"), "unique content").unwrap();

        fs::create_dir(root.join("subdir")).unwrap();
        fs::write(root.join("subdir/file4.txt"), "duplicate content here").unwrap();

        temp
    }

    #[test]
    fn test_full_hash_identity() {
        let temp = create_test_files();
        let finder = DuplicateFinder::new();
        let cancel = CancelFlag::new();

        let h1 = finder
            .full_hash(&temp.path().join("file1.txt"), &cancel)
            .unwrap();
        let h2 = finder
            .full_hash(&temp.path().join("file2.txt"), &cancel)
            .unwrap();
        let h3 = finder
            .full_hash(&temp.path().join("file3.txt"), &cancel)
            .unwrap();

        assert!(h1.is_some());
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_partial_fingerprint_matches_for_identical_files() {
        let temp = create_test_files();
        let finder = DuplicateFinder::new();

        let f1 = finder
            .partial_fingerprint(&temp.path().join("file1.txt"))
            .unwrap();
        let f2 = finder
            .partial_fingerprint(&temp.path().join("file2.txt"))
            .unwrap();
        assert_eq!(f1, f2);
    }

    #[test]
    fn test_vanished_file_is_skipped_not_fatal() {
        let temp = create_test_files();
        let finder = DuplicateFinder::new();

        let gone = temp.path().join("file1.txt");
        let mut records = vec![
            record_for(&gone),
            record_for(&temp.path().join("file2.txt")),
            record_for(&temp.path().join("subdir/file4.txt")),
        ];
        // Records observed, then the file disappears before hashing.
        fs::remove_file(&gone).unwrap();
        records[0].size = records[1].size; // keep it in the same size bucket

        let report = finder.find_duplicates(&records, &CancelFlag::new());

        assert_eq!(report.status, ScanStatus::Completed);
        assert_eq!(report.skips.len(), 1);
        assert_eq!(report.skips[0].path, gone);
        // The two surviving copies still form a group.
        assert_eq!(report.group_count, 1);
        assert_eq!(report.groups[0].count(), 2);
    }

    #[test]
    fn test_cancelled_pass_reports_cancelled() {
        let temp = create_test_files();
        let records: Vec<FileRecord> = ["file1.txt", "file2.txt", "subdir/file4.txt"]
            .iter()
            .map(|n| record_for(&temp.path().join(n)))
            .collect();

        let cancel = CancelFlag::new();
        cancel.cancel();

        let report = DuplicateFinder::new().find_duplicates(&records, &cancel);
        assert_eq!(report.status, ScanStatus::Cancelled);
        assert!(report.groups.is_empty());
    }
}
