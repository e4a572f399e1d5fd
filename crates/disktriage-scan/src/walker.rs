//! Parallel directory walker producing flat file records.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use disktriage_core::{
    CancelFlag, FileRecord, ScanConfig, ScanError, ScanOutcome, ScanStats, ScanStatus, SkipEvent,
    SkipKind, Timestamps,
};

use crate::progress::ScanProgress;
use crate::visited::VisitedTracker;

/// How often (in files) progress snapshots are broadcast.
const PROGRESS_EVERY: u64 = 1000;

/// Parallel scanner built on jwalk.
///
/// Each `scan` call is an independent depth-first pass with sorted
/// children, so two scans of an unchanged tree produce the same record
/// sequence on the same platform.
pub struct Walker {
    progress_tx: broadcast::Sender<ScanProgress>,
}

/// Entry collected during traversal, before directory aggregation.
enum Pending {
    File {
        path: PathBuf,
        size: u64,
        timestamps: Timestamps,
    },
    Dir {
        path: PathBuf,
        timestamps: Timestamps,
    },
}

impl Walker {
    /// Create a new walker.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan one root.
    ///
    /// Fails only for a malformed root or configuration; every per-entry
    /// failure is recorded as a skip event and the walk continues. A
    /// cancelled pass returns the records collected so far with
    /// [`ScanStatus::Cancelled`].
    pub fn scan(&self, config: &ScanConfig, cancel: &CancelFlag) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let scanned_at = SystemTime::now();

        let root = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;
        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }
        let ignore_set = config.ignore_set()?;

        let visited = Arc::new(VisitedTracker::new());
        if config.follow_symlinks {
            visited.enter_dir(&root);
        }

        let walker = {
            let cancel = cancel.clone();
            let excludes: Arc<[PathBuf]> = config.exclude_prefixes.clone().into();
            let ignores = ignore_set.clone();
            let visited = Arc::clone(&visited);
            let follow_symlinks = config.follow_symlinks;

            WalkDir::new(&root)
                .parallelism(parallelism_for(config.threads))
                .skip_hidden(!config.include_hidden)
                .follow_links(config.follow_symlinks)
                .sort(true)
                .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
                .process_read_dir(move |_depth, _dir, _state, children| {
                    // Stop descending as soon as cancellation is requested.
                    if cancel.is_cancelled() {
                        children.clear();
                        return;
                    }
                    for child in children.iter_mut().flatten() {
                        if child.read_children_path.is_none() {
                            continue;
                        }
                        let path = child.path();
                        if excludes.iter().any(|p| path.starts_with(p)) {
                            // Excluded prefix: descendants are never listed.
                            child.read_children_path = None;
                        } else if ignores.is_match(child.file_name().to_string_lossy().as_ref()) {
                            // Ignored directory name: drop the subtree too.
                            child.read_children_path = None;
                        } else if follow_symlinks && !visited.enter_dir(&path) {
                            // Real path already visited: a symlink cycle.
                            child.read_children_path = None;
                        }
                    }
                })
        };

        let mut pending: Vec<Pending> = Vec::new();
        let mut skips: Vec<SkipEvent> = Vec::new();
        let mut stats = ScanStats::new();
        let mut status = ScanStatus::Completed;

        for entry_result in walker {
            // Entry boundary: the one place a pass turns partial.
            if cancel.is_cancelled() {
                status = ScanStatus::Cancelled;
                break;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    let event = skip_from_walk_error(None, &err);
                    warn!(path = %event.path.display(), "skipping entry: {}", event.message);
                    skips.push(event);
                    continue;
                }
            };

            let path = entry.path();
            if config.is_excluded(&path) {
                continue;
            }
            if entry.depth() > 0 {
                let name = entry.file_name().to_string_lossy();
                if ignore_set.is_match(name.as_ref()) {
                    continue;
                }
            }

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                // Symlinks are not subjects of analysis.
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    let event = skip_from_walk_error(Some(&path), &err);
                    warn!(path = %path.display(), "unreadable metadata: {}", event.message);
                    skips.push(event);
                    continue;
                }
            };
            let timestamps = Timestamps::new(metadata.modified().ok(), metadata.accessed().ok());
            let depth = entry.depth() as u32;

            if file_type.is_dir() {
                stats.record_dir(depth);
                pending.push(Pending::Dir { path, timestamps });
            } else if file_type.is_file() {
                let size = metadata.len();
                stats.record_file(&path, size, depth);

                if stats.total_files % PROGRESS_EVERY == 0 {
                    let _ = self.progress_tx.send(ScanProgress {
                        files_scanned: stats.total_files,
                        dirs_scanned: stats.total_dirs,
                        bytes_scanned: stats.total_size,
                        entries_skipped: skips.len() as u64,
                        current_path: path.clone(),
                        elapsed: start.elapsed(),
                    });
                }

                pending.push(Pending::File {
                    path,
                    size,
                    timestamps,
                });
            }
        }

        let records = build_records(pending, &root);
        let duration = start.elapsed();

        let _ = self.progress_tx.send(ScanProgress {
            files_scanned: stats.total_files,
            dirs_scanned: stats.total_dirs,
            bytes_scanned: stats.total_size,
            entries_skipped: skips.len() as u64,
            current_path: root.clone(),
            elapsed: duration,
        });
        debug!(
            files = stats.total_files,
            dirs = stats.total_dirs,
            skipped = skips.len(),
            ?duration,
            cancelled = status.is_cancelled(),
            "scan finished"
        );

        Ok(ScanOutcome {
            records,
            skips,
            stats,
            status,
            root,
            scanned_at,
            duration,
        })
    }

    /// Scan several roots, each as an independent pass over a copy of the
    /// same configuration. Stops early once cancellation is requested.
    pub fn scan_many(
        &self,
        config: &ScanConfig,
        roots: &[PathBuf],
        cancel: &CancelFlag,
    ) -> Result<Vec<ScanOutcome>, ScanError> {
        let mut outcomes = Vec::with_capacity(roots.len());
        for root in roots {
            if cancel.is_cancelled() {
                break;
            }
            let mut per_root = config.clone();
            per_root.root = root.clone();
            outcomes.push(self.scan(&per_root, cancel)?);
        }
        Ok(outcomes)
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold files into their ancestor directories and materialize records in
/// traversal order.
fn build_records(pending: Vec<Pending>, root: &Path) -> Vec<FileRecord> {
    let mut dir_totals: HashMap<PathBuf, (u64, u64)> = pending
        .iter()
        .filter_map(|p| match p {
            Pending::Dir { path, .. } => Some((path.clone(), (0u64, 0u64))),
            Pending::File { .. } => None,
        })
        .collect();

    for p in &pending {
        if let Pending::File { path, size, .. } = p {
            let mut cursor = path.parent();
            while let Some(dir) = cursor {
                if !dir.starts_with(root) {
                    break;
                }
                if let Some((bytes, files)) = dir_totals.get_mut(dir) {
                    *bytes += size;
                    *files += 1;
                }
                if dir == root {
                    break;
                }
                cursor = dir.parent();
            }
        }
    }

    pending
        .into_iter()
        .map(|p| match p {
            Pending::File {
                path,
                size,
                timestamps,
            } => FileRecord::new_file(path, size, timestamps),
            Pending::Dir { path, timestamps } => {
                let (bytes, files) = dir_totals.get(&path).copied().unwrap_or((0, 0));
                FileRecord::new_directory(path, bytes, files, timestamps)
            }
        })
        .collect()
}

fn parallelism_for(threads: usize) -> Parallelism {
    match threads {
        0 => Parallelism::RayonDefaultPool {
            busy_timeout: Duration::from_millis(100),
        },
        n => Parallelism::RayonNewPool(n),
    }
}

/// Classify a jwalk error as a skip event.
fn skip_from_walk_error(path: Option<&Path>, err: &jwalk::Error) -> SkipEvent {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| err.path().map(Path::to_path_buf))
        .unwrap_or_default();
    match err.io_error() {
        Some(io) => SkipEvent::from_io(path, io, SkipKind::UnreadableMetadata),
        None => SkipEvent::new(path, SkipKind::UnreadableMetadata, err.to_string()),
    }
}
