//! Error taxonomy: fatal scan errors and recoverable skip events.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors. Only a malformed root (or configuration) stops a scan
/// before it starts; everything per-entry becomes a [`SkipEvent`].
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for the root path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Root path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Root path exists but is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of recoverable per-entry failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipKind {
    /// Permission was denied for the entry.
    AccessDenied,
    /// Entry disappeared between observation and use.
    PathVanished,
    /// Metadata could not be read.
    UnreadableMetadata,
    /// Content could not be read while hashing.
    HashReadFailure,
}

/// A recorded, non-fatal failure to process one filesystem entry.
///
/// The offending entry is excluded from results and the pass continues;
/// skip events are surfaced to the consuming layer, never silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipEvent {
    /// Path where the failure occurred.
    pub path: PathBuf,
    /// Kind of failure.
    pub kind: SkipKind,
    /// Human-readable message.
    pub message: String,
}

impl SkipEvent {
    /// Create a new skip event.
    pub fn new(path: impl Into<PathBuf>, kind: SkipKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Entry metadata could not be read.
    pub fn metadata(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::from_io(path, error, SkipKind::UnreadableMetadata)
    }

    /// Entry content could not be read during hashing.
    pub fn hash_read(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::from_io(path, error, SkipKind::HashReadFailure)
    }

    /// Classify an I/O error, using `fallback` when the error kind carries
    /// no more specific meaning.
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error, fallback: SkipKind) -> Self {
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => SkipKind::AccessDenied,
            std::io::ErrorKind::NotFound => SkipKind::PathVanished,
            _ => fallback,
        };
        Self::new(path, kind, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io_classification() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
    }

    #[test]
    fn test_skip_event_from_io() {
        let gone = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let event = SkipEvent::hash_read("/test/file", &gone);
        assert_eq!(event.kind, SkipKind::PathVanished);

        let other = std::io::Error::other("short read");
        let event = SkipEvent::hash_read("/test/file", &other);
        assert_eq!(event.kind, SkipKind::HashReadFailure);
        assert!(event.message.contains("short read"));
    }
}
