//! disktriage - disk-usage triage from the command line.
//!
//! Usage:
//!   dtri scan [PATH]         Scan and show a summary with category totals
//!   dtri duplicates [PATH]   Find byte-identical duplicate files
//!   dtri reclaim [PATH]      Flag reclaimable-space candidates
//!   dtri filter [PATH]       List records matching filter options
//!   dtri export [PATH]       Export scan results to JSON
//!   dtri --help              Show help
//!
//! The binary is a read-only consumer of the engine: it never moves,
//! deletes, or compresses anything.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::SystemTime;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};

use disktriage_analyze::{
    DuplicateConfig, DuplicateFinder, FileFilter, FilterConfig, ReclaimReason, SmartAnalyzer,
    SmartConfig, SortKey, empty_folders, sort_records,
};
use disktriage_core::{
    CancelFlag, Category, FileRecord, ScanOutcome, SkipEvent, assign_categories,
};
use disktriage_scan::{ScanConfig, Walker};
use strum::IntoEnumIterator;

#[derive(Parser)]
#[command(
    name = "disktriage",
    version,
    about = "Disk-usage triage: scan, classify, dedupe, and flag reclaimable space",
    long_about = "disktriage inventories a directory tree, classifies every file, \
                  finds byte-identical duplicates, and flags likely-reclaimable \
                  space. It only reports; nothing is ever modified."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and show a summary
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Path prefixes to exclude entirely (repeatable)
        #[arg(short = 'x', long = "exclude")]
        excludes: Vec<PathBuf>,

        /// Number of largest files to show
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },

    /// Find duplicate files
    Duplicates {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Path prefixes to exclude entirely (repeatable)
        #[arg(short = 'x', long = "exclude")]
        excludes: Vec<PathBuf>,

        /// Minimum file size to consider (e.g., "1KB", "1MB")
        #[arg(short, long, default_value = "1KB")]
        min_size: String,

        /// Maximum number of duplicate groups to show
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Flag reclaimable-space candidates
    Reclaim {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Path prefixes to exclude entirely (repeatable)
        #[arg(short = 'x', long = "exclude")]
        excludes: Vec<PathBuf>,

        /// Age after which a download counts as stale (e.g., "90d", "6m")
        #[arg(short, long, default_value = "90d")]
        stale: String,

        /// Aggregate size above which a folder counts as oversized
        #[arg(short, long, default_value = "1GB")]
        oversized: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List records matching filter options
    Filter {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Path prefixes to exclude entirely (repeatable)
        #[arg(short = 'x', long = "exclude")]
        excludes: Vec<PathBuf>,

        /// Categories to keep (repeatable: video, audio, image, document,
        /// archive, code, game, other)
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Minimum file size (e.g., "10MB")
        #[arg(short, long, default_value = "0")]
        min_size: String,

        /// Minimum days since last access
        #[arg(short, long)]
        older_than: Option<u64>,

        /// Case-insensitive substring of the name or path
        #[arg(long)]
        name: Option<String>,

        /// Sort order
        #[arg(short, long, default_value = "size")]
        sort: SortOrder,

        /// Maximum number of records to show
        #[arg(short = 'n', long, default_value = "50")]
        top: usize,
    },

    /// Export scan results to JSON
    Export {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Path prefixes to exclude entirely (repeatable)
        #[arg(short = 'x', long = "exclude")]
        excludes: Vec<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum SortOrder {
    #[default]
    Size,
    Accessed,
    Staleness,
    Name,
    Category,
}

impl From<SortOrder> for SortKey {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Size => SortKey::Size,
            SortOrder::Accessed => SortKey::Accessed,
            SortOrder::Staleness => SortKey::Staleness,
            SortOrder::Name => SortKey::Name,
            SortOrder::Category => SortKey::Category,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            path,
            excludes,
            top,
        } => run_scan(&path, excludes, top),
        Command::Duplicates {
            path,
            excludes,
            min_size,
            top,
            format,
        } => run_duplicates(&path, excludes, &min_size, top, format),
        Command::Reclaim {
            path,
            excludes,
            stale,
            oversized,
            format,
        } => run_reclaim(&path, excludes, &stale, &oversized, format),
        Command::Filter {
            path,
            excludes,
            categories,
            min_size,
            older_than,
            name,
            sort,
            top,
        } => run_filter(
            &path, excludes, categories, &min_size, older_than, name, sort, top,
        ),
        Command::Export {
            path,
            excludes,
            output,
        } => run_export(&path, excludes, output),
    }
}

/// Scan a tree and return its outcome with categories assigned.
fn walk(path: &PathBuf, excludes: Vec<PathBuf>) -> Result<ScanOutcome> {
    eprintln!("Scanning {}...", path.display());

    let config = ScanConfig::builder()
        .root(path.clone())
        .exclude_prefixes(excludes)
        .build()
        .map_err(|e| eyre!("{e}"))?;

    let walker = Walker::new();
    let mut outcome = walker.scan(&config, &CancelFlag::new()).context("Scan failed")?;
    assign_categories(&mut outcome.records);
    Ok(outcome)
}

/// Run a quick scan and display summary.
fn run_scan(path: &PathBuf, excludes: Vec<PathBuf>, top_n: usize) -> Result<()> {
    let outcome = walk(path, excludes)?;

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        outcome.root.display(),
        format_size(outcome.total_size())
    );
    println!(
        " {} files, {} directories",
        outcome.stats.total_files, outcome.stats.total_dirs
    );
    println!(" Scanned in {:.2}s", outcome.duration.as_secs_f64());
    println!("{}", "─".repeat(60));
    println!();

    // Category totals
    println!(" By category:");
    for category in Category::iter() {
        let (count, bytes) = outcome
            .files()
            .filter(|r| r.category == Some(category))
            .fold((0u64, 0u64), |(c, b), r| (c + 1, b + r.size));
        if count > 0 {
            println!(
                "   {:<10} {:>10}  {:>8} files",
                category.to_string(),
                format_size(bytes),
                count
            );
        }
    }
    println!();

    // Largest files
    println!(" Largest files:");
    let mut files: Vec<&FileRecord> = outcome.files().collect();
    files.sort_by(|a, b| b.size.cmp(&a.size));
    for record in files.iter().take(top_n) {
        println!(
            "   {:>10}  {}",
            format_size(record.size),
            record.path.display()
        );
    }

    print_skips(&outcome.skips);
    Ok(())
}

/// Run duplicate detection.
fn run_duplicates(
    path: &PathBuf,
    excludes: Vec<PathBuf>,
    min_size: &str,
    top_n: usize,
    format: OutputFormat,
) -> Result<()> {
    let min_bytes = parse_size(min_size)?;
    let outcome = walk(path, excludes)?;

    eprintln!("Finding duplicates (min size: {min_size})...");

    let config = DuplicateConfig::builder()
        .min_size(min_bytes)
        .max_groups(top_n)
        .build()
        .map_err(|e| eyre!("{e}"))?;

    let finder = DuplicateFinder::with_config(config);
    let report = finder.find_duplicates(&outcome.records, &CancelFlag::new());

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Duplicate File Report");
            println!("{}", "─".repeat(70));
            println!();

            if report.groups.is_empty() {
                println!(" No duplicate files found.");
            } else {
                println!(
                    " Found {} duplicate groups ({} files)",
                    report.group_count, report.files_with_duplicates
                );
                println!(
                    " Total wasted space: {}",
                    format_size(report.total_wasted_space)
                );
                println!();

                for (i, group) in report.groups.iter().enumerate() {
                    println!(
                        " Group {} ({} files, {} each, {} wasted)",
                        i + 1,
                        group.count(),
                        format_size(group.size),
                        format_size(group.wasted_bytes)
                    );
                    for path in &group.paths {
                        println!("   {}", path.display());
                    }
                    println!();
                }
            }
            print_skips(&report.skips);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Run smart analysis.
fn run_reclaim(
    path: &PathBuf,
    excludes: Vec<PathBuf>,
    stale: &str,
    oversized: &str,
    format: OutputFormat,
) -> Result<()> {
    let stale_after = parse_duration(stale)?;
    let oversized_min_bytes = parse_size(oversized)?;
    let outcome = walk(path, excludes)?;

    eprintln!("Analyzing reclaimable space...");

    let config = SmartConfig::builder()
        .stale_after(stale_after)
        .oversized_min_bytes(oversized_min_bytes)
        .build()
        .map_err(|e| eyre!("{e}"))?;

    let analyzer = SmartAnalyzer::with_config(config);
    let report = analyzer.analyze(&outcome.records, &CancelFlag::new());
    let empty = empty_folders(&outcome.records);

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Reclaimable Space Report");
            println!("{}", "─".repeat(70));
            println!();
            println!(
                " Potential savings: {} (temp {}, stale downloads {})",
                format_size(report.potential_savings),
                format_size(report.temp_bytes),
                format_size(report.stale_download_bytes)
            );
            println!();

            for reason in [
                ReclaimReason::TempFile,
                ReclaimReason::StaleDownload,
                ReclaimReason::OversizedFolder,
            ] {
                let hits: Vec<_> = report.with_reason(reason).collect();
                if hits.is_empty() {
                    continue;
                }
                println!(" {reason} ({} candidates):", hits.len());
                for candidate in hits {
                    println!(
                        "   {:>10}  {:.0}%  {}",
                        format_size(candidate.reclaimable_bytes),
                        candidate.confidence * 100.0,
                        candidate.path.display()
                    );
                }
                println!();
            }

            if !empty.is_empty() {
                println!(" Empty folders ({}):", empty.len());
                for folder in &empty {
                    println!("   {}", folder.display());
                }
                println!();
            }

            if !report.has_candidates() && empty.is_empty() {
                println!(" Nothing obviously reclaimable found.");
            }
            print_skips(&outcome.skips);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// List records matching filter options.
#[allow(clippy::too_many_arguments)]
fn run_filter(
    path: &PathBuf,
    excludes: Vec<PathBuf>,
    categories: Vec<String>,
    min_size: &str,
    older_than: Option<u64>,
    name: Option<String>,
    sort: SortOrder,
    top_n: usize,
) -> Result<()> {
    let min_bytes = parse_size(min_size)?;
    let category_set: Option<std::collections::HashSet<Category>> = if categories.is_empty() {
        None
    } else {
        Some(
            categories
                .iter()
                .map(|c| Category::from_str(c).map_err(|_| eyre!("unknown category: {c}")))
                .collect::<Result<_>>()?,
        )
    };

    let outcome = walk(path, excludes)?;

    let config = FilterConfig::builder()
        .categories(category_set)
        .min_size(min_bytes)
        .min_access_age_days(older_than)
        .name_substring(name)
        .build()
        .map_err(|e| eyre!("{e}"))?;

    let now = SystemTime::now();
    let filter = FileFilter::with_reference_time(config, now);
    let mut matched: Vec<FileRecord> = outcome
        .files()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    sort_records(&mut matched, sort.into(), true, now);

    println!();
    println!(
        " {} of {} files match",
        matched.len(),
        outcome.total_files()
    );
    println!();
    for record in matched.iter().take(top_n) {
        println!(
            "   {:>10}  {:<9} {:<17} {}",
            format_size(record.size),
            record
                .category
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_date(record.timestamps.best_access()),
            record.path.display()
        );
    }
    if matched.len() > top_n {
        println!("   ... and {} more", matched.len() - top_n);
    }

    print_skips(&outcome.skips);
    Ok(())
}

/// Export scan results to JSON.
fn run_export(path: &PathBuf, excludes: Vec<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let outcome = walk(path, excludes)?;
    let json = serde_json::to_string_pretty(&outcome)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{json}");
        }
    }

    Ok(())
}

/// Surface skip events so they are never silently dropped.
fn print_skips(skips: &[SkipEvent]) {
    if skips.is_empty() {
        return;
    }
    println!();
    println!(" {} entries skipped:", skips.len());
    for skip in skips {
        println!("   {} ({:?})", skip.path.display(), skip.kind);
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Format an optional timestamp as a readable date.
fn format_date(stamp: Option<SystemTime>) -> String {
    match stamp {
        Some(t) => chrono::DateTime::<chrono::Local>::from(t)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "unknown".to_string(),
    }
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();

    let (num, multiplier) = if s.ends_with("GB") || s.ends_with('G') {
        let num: f64 = s
            .trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()?;
        (num, 1024 * 1024 * 1024)
    } else if s.ends_with("MB") || s.ends_with('M') {
        let num: f64 = s
            .trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()?;
        (num, 1024 * 1024)
    } else if s.ends_with("KB") || s.ends_with('K') {
        let num: f64 = s
            .trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()?;
        (num, 1024)
    } else if s.ends_with('B') {
        let num: f64 = s
            .trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()?;
        (num, 1)
    } else {
        let num: f64 = s.parse()?;
        (num, 1)
    };

    Ok((num * multiplier as f64) as u64)
}

/// Parse a duration string (e.g., "1y", "6m", "90d", "1w").
fn parse_duration(s: &str) -> Result<std::time::Duration> {
    let s = s.trim().to_lowercase();

    let (num, multiplier) = if s.ends_with('y') {
        let num: f64 = s.trim_end_matches('y').parse()?;
        (num, 365.0 * 24.0 * 60.0 * 60.0)
    } else if s.ends_with('m') {
        let num: f64 = s.trim_end_matches('m').parse()?;
        (num, 30.0 * 24.0 * 60.0 * 60.0)
    } else if s.ends_with('w') {
        let num: f64 = s.trim_end_matches('w').parse()?;
        (num, 7.0 * 24.0 * 60.0 * 60.0)
    } else if s.ends_with('d') {
        let num: f64 = s.trim_end_matches('d').parse()?;
        (num, 24.0 * 60.0 * 60.0)
    } else {
        let num: f64 = s.parse()?;
        (num, 24.0 * 60.0 * 60.0) // Default to days
    };

    Ok(std::time::Duration::from_secs_f64(num * multiplier))
}
