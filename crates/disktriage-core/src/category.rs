//! Extension-based file categorization.
//!
//! Categorization is a pure function of the extension (plus a path check
//! for game executables): no I/O, no state, the same answer for the same
//! extension across a whole run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::record::FileRecord;

/// Coarse file-type classification derived from the extension.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    Video,
    Audio,
    Image,
    Document,
    Archive,
    Code,
    Game,
    Other,
}

/// Directory name fragments that mark game installations. An `.exe` under
/// one of these paths is a game; elsewhere it is just `Other`.
const GAME_PATH_MARKERS: &[&str] = &[
    "steam",
    "steamapps",
    "epic games",
    "origin",
    "ubisoft",
    "games",
    "riot games",
    "battle.net",
    "gog galaxy",
    "xbox",
];

/// Categorize a bare extension (with or without the leading dot).
///
/// Total and case-insensitive; unrecognized or empty extensions map to
/// [`Category::Other`]. The `Game` category is path-dependent and never
/// produced here; see [`categorize`].
pub fn categorize_extension(extension: &str) -> Category {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "mp4" | "mkv" | "avi" | "mov" | "wmv" | "flv" | "webm" | "m4v" | "mpeg" | "mpg"
        | "3gp" => Category::Video,
        "mp3" | "wav" | "flac" | "aac" | "ogg" | "wma" | "m4a" | "opus" => Category::Audio,
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" | "ico" | "tiff" | "raw"
        | "psd" => Category::Image,
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "txt" | "rtf" | "odt"
        | "ods" => Category::Document,
        "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "iso" => Category::Archive,
        "py" | "js" | "ts" | "java" | "cpp" | "c" | "h" | "cs" | "go" | "rs" | "rb" | "php" => {
            Category::Code
        }
        _ => Category::Other,
    }
}

/// Categorize a file record.
///
/// Pure and total: every record receives exactly one category. `.exe`
/// files under a known game-install path become `Game`; everything else
/// goes through the extension table.
pub fn categorize(record: &FileRecord) -> Category {
    if record.extension.eq_ignore_ascii_case("exe") && is_game_path(&record.path) {
        return Category::Game;
    }
    categorize_extension(&record.extension)
}

/// Annotate a record set in place. Directories are left unassigned.
pub fn assign_categories(records: &mut [FileRecord]) {
    for record in records.iter_mut() {
        if record.is_file() {
            record.category = Some(categorize(record));
        }
    }
}

fn is_game_path(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    GAME_PATH_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Timestamps;

    fn file(path: &str) -> FileRecord {
        FileRecord::new_file(path, 1024, Timestamps::default())
    }

    #[test]
    fn test_known_extensions() {
        assert_eq!(categorize_extension("mp4"), Category::Video);
        assert_eq!(categorize_extension("flac"), Category::Audio);
        assert_eq!(categorize_extension("jpeg"), Category::Image);
        assert_eq!(categorize_extension("pdf"), Category::Document);
        assert_eq!(categorize_extension("7z"), Category::Archive);
        assert_eq!(categorize_extension("rs"), Category::Code);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(categorize_extension("MP4"), Category::Video);
        assert_eq!(categorize_extension(".PnG"), Category::Image);
    }

    #[test]
    fn test_unrecognized_is_other() {
        assert_eq!(categorize_extension("xyz123"), Category::Other);
        assert_eq!(categorize_extension(""), Category::Other);
        assert_eq!(categorize(&file("/home/user/notes.xyz123")), Category::Other);
        assert_eq!(categorize(&file("/home/user/README")), Category::Other);
    }

    #[test]
    fn test_exe_is_game_only_under_game_paths() {
        assert_eq!(
            categorize(&file("/games/steamapps/common/thing/launcher.exe")),
            Category::Game
        );
        assert_eq!(categorize(&file("/opt/tools/setup.exe")), Category::Other);
    }

    #[test]
    fn test_assign_categories_skips_directories() {
        let mut records = vec![
            file("/data/clip.mp4"),
            FileRecord::new_directory("/data", 0, 1, Timestamps::default()),
        ];
        assign_categories(&mut records);
        assert_eq!(records[0].category, Some(Category::Video));
        assert!(records[1].category.is_none());
    }
}
