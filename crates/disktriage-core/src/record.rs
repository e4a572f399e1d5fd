//! File record types.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// BLAKE3 content hash identifying file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Modification and access times captured at scan time.
///
/// Either may be unavailable depending on platform and permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time, if available.
    pub modified: Option<SystemTime>,
    /// Last access time, if available.
    pub accessed: Option<SystemTime>,
}

impl Timestamps {
    /// Create timestamps from whatever the platform reported.
    pub fn new(modified: Option<SystemTime>, accessed: Option<SystemTime>) -> Self {
        Self { modified, accessed }
    }

    /// Create timestamps with only a modified time.
    pub fn with_modified(modified: SystemTime) -> Self {
        Self {
            modified: Some(modified),
            accessed: None,
        }
    }

    /// Best available access time: the access time, falling back to the
    /// modified time when the platform did not report one.
    pub fn best_access(&self) -> Option<SystemTime> {
        self.accessed.or(self.modified)
    }
}

/// Kind of scanned entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Regular file.
    File,
    /// Directory, enumerated as an aggregate node.
    Directory {
        /// Total number of files in this subtree.
        file_count: u64,
    },
}

impl RecordKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, RecordKind::Directory { .. })
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, RecordKind::File)
    }
}

/// Immutable snapshot of one filesystem entry at observation time.
///
/// The `path` was valid when the record was created but may be stale by the
/// time a downstream consumer acts on it; anything destructive must
/// re-validate existence first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path; unique key within one scan.
    pub path: PathBuf,

    /// Size in bytes at observation time (aggregate descendant size for
    /// directories).
    pub size: u64,

    /// Timestamps captured at scan time.
    pub timestamps: Timestamps,

    /// Lower-cased extension without the dot; empty when the name has none.
    pub extension: CompactString,

    /// Category assigned after the scan by the categorizer; never set by
    /// the walker. Directories stay unassigned.
    pub category: Option<Category>,

    /// Entry kind and associated metadata.
    pub kind: RecordKind,
}

impl FileRecord {
    /// Create a new file record. The extension is derived from the path.
    pub fn new_file(path: impl Into<PathBuf>, size: u64, timestamps: Timestamps) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        Self {
            path,
            size,
            timestamps,
            extension,
            category: None,
            kind: RecordKind::File,
        }
    }

    /// Create a new directory record with its aggregate size and file count.
    pub fn new_directory(
        path: impl Into<PathBuf>,
        size: u64,
        file_count: u64,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            path: path.into(),
            size,
            timestamps,
            extension: CompactString::default(),
            category: None,
            kind: RecordKind::Directory { file_count },
        }
    }

    /// Check if this record is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this record is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// File count for directories, 1 for files.
    pub fn file_count(&self) -> u64 {
        match self.kind {
            RecordKind::Directory { file_count } => file_count,
            RecordKind::File => 1,
        }
    }

    /// Final path component as a string.
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }
}

/// Lower-cased extension of a path, without the leading dot.
fn extension_of(path: &Path) -> CompactString {
    path.extension()
        .map(|e| {
            let mut ext = CompactString::new(e.to_string_lossy());
            ext.make_ascii_lowercase();
            ext
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(hash.to_hex().starts_with("abab"));
    }

    #[test]
    fn test_file_record_extension_lowercased() {
        let record = FileRecord::new_file(
            "/data/Movie.MKV",
            1024,
            Timestamps::with_modified(SystemTime::now()),
        );
        assert!(record.is_file());
        assert_eq!(record.extension.as_str(), "mkv");
        assert_eq!(record.file_name(), "Movie.MKV");
    }

    #[test]
    fn test_file_record_without_extension() {
        let record = FileRecord::new_file("/data/README", 10, Timestamps::default());
        assert!(record.extension.is_empty());
        assert!(record.category.is_none());
    }

    #[test]
    fn test_directory_record() {
        let record = FileRecord::new_directory("/data", 4096, 12, Timestamps::default());
        assert!(record.is_dir());
        assert!(!record.is_file());
        assert_eq!(record.file_count(), 12);
        assert_eq!(record.size, 4096);
    }

    #[test]
    fn test_best_access_falls_back_to_modified() {
        let now = SystemTime::now();
        let only_modified = Timestamps::with_modified(now);
        assert_eq!(only_modified.best_access(), Some(now));

        let neither = Timestamps::default();
        assert_eq!(neither.best_access(), None);
    }
}
