//! Scan configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Path prefixes to skip entirely; a prefix excludes itself and all of
    /// its descendants.
    #[builder(default)]
    #[serde(default)]
    pub exclude_prefixes: Vec<PathBuf>,

    /// Entry names to ignore (glob syntax).
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links into directories. Symlinked directories are
    /// only descended on first visit of their real path.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Number of worker threads (0 = use the default rayon pool).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude_prefixes: Vec::new(),
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
            max_depth: None,
            threads: 0,
            include_hidden: true,
        }
    }

    /// Check if a path falls under one of the excluded prefixes.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude_prefixes.iter().any(|p| path.starts_with(p))
    }

    /// Compile the ignore patterns into a matcher.
    pub fn ignore_set(&self) -> Result<GlobSet, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("bad ignore pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .threads(4usize)
            .follow_symlinks(true)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.threads, 4);
        assert!(config.follow_symlinks);
    }

    #[test]
    fn test_builder_requires_root() {
        assert!(ScanConfig::builder().threads(2usize).build().is_err());
        assert!(ScanConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_exclude_prefixes() {
        let config = ScanConfig::builder()
            .root("/data")
            .exclude_prefixes(vec![PathBuf::from("/data/skip")])
            .build()
            .unwrap();

        assert!(config.is_excluded(Path::new("/data/skip")));
        assert!(config.is_excluded(Path::new("/data/skip/deep/file.txt")));
        assert!(!config.is_excluded(Path::new("/data/keep/file.txt")));
        // Component-wise prefix match, not a string prefix.
        assert!(!config.is_excluded(Path::new("/data/skipper")));
    }

    #[test]
    fn test_ignore_set() {
        let config = ScanConfig::builder()
            .root("/test")
            .ignore_patterns(vec!["node_modules".to_string(), "*.log".to_string()])
            .build()
            .unwrap();

        let set = config.ignore_set().unwrap();
        assert!(set.is_match("node_modules"));
        assert!(set.is_match("test.log"));
        assert!(!set.is_match("src"));
    }

    #[test]
    fn test_bad_ignore_pattern() {
        let config = ScanConfig::builder()
            .root("/test")
            .ignore_patterns(vec!["[".to_string()])
            .build()
            .unwrap();

        assert!(matches!(
            config.ignore_set(),
            Err(ScanError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_should_skip_hidden() {
        let mut config = ScanConfig::new("/test");
        assert!(!config.should_skip_hidden(".git"));

        config.include_hidden = false;
        assert!(config.should_skip_hidden(".git"));
        assert!(!config.should_skip_hidden("src"));
    }
}
