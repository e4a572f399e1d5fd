//! Record filtering and ordering.

use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use disktriage_core::{Category, FileRecord};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Filter options over a record sequence.
///
/// All options are conjunctive; an absent option imposes no constraint.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
pub struct FilterConfig {
    /// Categories to keep (None = any).
    pub categories: Option<HashSet<Category>>,

    /// Minimum size in bytes.
    pub min_size: u64,

    /// Minimum days since last access (modified time when access time is
    /// unavailable). Records with no timestamps at all never match.
    pub min_access_age_days: Option<u64>,

    /// Case-insensitive substring matched against the file name or the
    /// full path.
    pub name_substring: Option<String>,
}

impl FilterConfig {
    /// Create a new filter config builder.
    pub fn builder() -> FilterConfigBuilder {
        FilterConfigBuilder::default()
    }
}

/// Compiled filter applying the configured predicates.
///
/// Predicates are ANDed; their evaluation order never changes the result.
pub struct FileFilter {
    config: FilterConfig,
    reference_time: SystemTime,
    needle: Option<String>,
}

impl FileFilter {
    /// Compile a filter, evaluating ages against the current time.
    pub fn new(config: FilterConfig) -> Self {
        Self::with_reference_time(config, SystemTime::now())
    }

    /// Compile a filter with an explicit reference time for age checks.
    pub fn with_reference_time(config: FilterConfig, reference_time: SystemTime) -> Self {
        let needle = config.name_substring.as_ref().map(|s| s.to_lowercase());
        Self {
            config,
            reference_time,
            needle,
        }
    }

    /// Check a single record against every configured predicate.
    pub fn matches(&self, record: &FileRecord) -> bool {
        if let Some(categories) = &self.config.categories {
            match record.category {
                Some(category) if categories.contains(&category) => {}
                // No category (directories, unannotated records) fails a
                // category constraint closed.
                _ => return false,
            }
        }

        if record.size < self.config.min_size {
            return false;
        }

        if let Some(min_days) = self.config.min_access_age_days {
            // Missing timestamps fail age filters closed.
            let Some(stamp) = record.timestamps.best_access() else {
                return false;
            };
            let age = self
                .reference_time
                .duration_since(stamp)
                .unwrap_or(Duration::ZERO);
            if age < Duration::from_secs(min_days * SECS_PER_DAY) {
                return false;
            }
        }

        if let Some(needle) = &self.needle {
            let name_hit = record.file_name().to_lowercase().contains(needle);
            let path_hit = || {
                record
                    .path
                    .to_string_lossy()
                    .to_lowercase()
                    .contains(needle)
            };
            if !name_hit && !path_hit() {
                return false;
            }
        }

        true
    }

    /// Apply the filter to a record sequence, preserving input order.
    pub fn apply<'a>(&self, records: &'a [FileRecord]) -> Vec<&'a FileRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Staleness score: larger and colder files score higher.
///
/// `size_in_mib * days_since_access`; 0.0 when no timestamp is available.
pub fn staleness_score(record: &FileRecord, reference_time: SystemTime) -> f64 {
    let Some(stamp) = record.timestamps.best_access() else {
        return 0.0;
    };
    let days = reference_time
        .duration_since(stamp)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
        / SECS_PER_DAY as f64;
    let size_mib = record.size as f64 / (1024.0 * 1024.0);
    size_mib * days
}

/// Ordering key for presenting records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Size,
    Accessed,
    Staleness,
    Name,
    Category,
}

/// Sort records in place by the given key.
///
/// `descending` is the usual presentation order for sizes and staleness.
pub fn sort_records(
    records: &mut [FileRecord],
    key: SortKey,
    descending: bool,
    reference_time: SystemTime,
) {
    match key {
        SortKey::Size => records.sort_by_key(|r| r.size),
        SortKey::Accessed => records.sort_by_key(|r| r.timestamps.best_access()),
        SortKey::Staleness => records.sort_by(|a, b| {
            staleness_score(a, reference_time)
                .partial_cmp(&staleness_score(b, reference_time))
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortKey::Name => records.sort_by_key(|r| r.file_name().to_lowercase()),
        SortKey::Category => records.sort_by_key(|r| r.category),
    }
    if descending {
        records.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disktriage_core::{Timestamps, assign_categories};

    fn record(path: &str, size: u64, accessed_days_ago: Option<u64>) -> FileRecord {
        let now = SystemTime::now();
        let timestamps = match accessed_days_ago {
            Some(days) => Timestamps::new(
                Some(now - Duration::from_secs(days * SECS_PER_DAY)),
                Some(now - Duration::from_secs(days * SECS_PER_DAY)),
            ),
            None => Timestamps::default(),
        };
        FileRecord::new_file(path, size, timestamps)
    }

    fn sample_records() -> Vec<FileRecord> {
        let mut records = vec![
            record("/media/movie.mp4", 20 * 1024 * 1024, Some(200)),
            record("/media/song.mp3", 5 * 1024 * 1024, Some(10)),
            record("/docs/report.pdf", 100 * 1024, Some(400)),
            record("/misc/unknown.bin", 50 * 1024 * 1024, None),
        ];
        assign_categories(&mut records);
        records
    }

    #[test]
    fn test_empty_filter_matches_everything_in_order() {
        let records = sample_records();
        let filter = FileFilter::new(FilterConfig::default());
        let matched = filter.apply(&records);

        assert_eq!(matched.len(), records.len());
        let paths: Vec<_> = matched.iter().map(|r| &r.path).collect();
        let expected: Vec<_> = records.iter().map(|r| &r.path).collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_category_and_size_compose() {
        let records = sample_records();
        let config = FilterConfig::builder()
            .categories(Some(HashSet::from([Category::Video])))
            .min_size(10u64 * 1024 * 1024)
            .build()
            .unwrap();
        let filter = FileFilter::new(config);
        let matched = filter.apply(&records);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].file_name(), "movie.mp4");
    }

    #[test]
    fn test_predicate_order_is_irrelevant() {
        // Same options, both orders of construction: same result set.
        let records = sample_records();
        let a = FilterConfig::builder()
            .categories(Some(HashSet::from([Category::Video, Category::Document])))
            .min_access_age_days(Some(100u64))
            .build()
            .unwrap();
        let b = FilterConfig::builder()
            .min_access_age_days(Some(100u64))
            .categories(Some(HashSet::from([Category::Document, Category::Video])))
            .build()
            .unwrap();

        let hits_a: Vec<_> = FileFilter::new(a)
            .apply(&records)
            .iter()
            .map(|r| r.path.clone())
            .collect();
        let hits_b: Vec<_> = FileFilter::new(b)
            .apply(&records)
            .iter()
            .map(|r| r.path.clone())
            .collect();
        assert_eq!(hits_a, hits_b);
        assert_eq!(hits_a.len(), 2);
    }

    #[test]
    fn test_missing_timestamps_fail_age_filter_closed() {
        let records = sample_records();
        let config = FilterConfig::builder()
            .min_access_age_days(Some(1u64))
            .build()
            .unwrap();
        let matched = FileFilter::new(config).apply(&records);

        // unknown.bin has no timestamps and must not match.
        assert!(matched.iter().all(|r| r.file_name() != "unknown.bin"));
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn test_name_substring_case_insensitive() {
        let records = sample_records();
        let config = FilterConfig::builder()
            .name_substring(Some("MOVIE".to_string()))
            .build()
            .unwrap();
        let matched = FileFilter::new(config).apply(&records);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].file_name(), "movie.mp4");

        // Path segments match too.
        let config = FilterConfig::builder()
            .name_substring(Some("/media/".to_string()))
            .build()
            .unwrap();
        assert_eq!(FileFilter::new(config).apply(&records).len(), 2);
    }

    #[test]
    fn test_staleness_score() {
        let now = SystemTime::now();
        let cold = record("/a", 10 * 1024 * 1024, Some(100));
        let warm = record("/b", 10 * 1024 * 1024, Some(1));
        let unknown = record("/c", 10 * 1024 * 1024, None);

        assert!(staleness_score(&cold, now) > staleness_score(&warm, now));
        assert_eq!(staleness_score(&unknown, now), 0.0);
    }

    #[test]
    fn test_sort_records() {
        let mut records = sample_records();
        sort_records(&mut records, SortKey::Size, true, SystemTime::now());
        assert_eq!(records[0].file_name(), "unknown.bin");
        assert_eq!(records[3].file_name(), "report.pdf");

        sort_records(&mut records, SortKey::Name, false, SystemTime::now());
        assert_eq!(records[0].file_name(), "movie.mp4");
    }
}
