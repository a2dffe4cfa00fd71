//! Derived views over the organized archive, for the viewer front end.
//!
//! Nothing here is cached: callers re-scan (and re-derive the set of paths
//! they are allowed to touch) on every call, so manual edits to the archive
//! are always reflected.
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::organizer::is_video_file;

/// One archived session file, as parsed from its path.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingInfo {
    pub path: PathBuf,
    pub filename: String,
    pub game_name: String,
    pub session_date: NaiveDate,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

/// Parses `{game} Session {YYYY-MM-DD} #{n}.{ext}` into (game, date).
pub fn parse_session_filename(filename: &str) -> Option<(String, NaiveDate)> {
    let marker = " Session ";
    let idx = filename.rfind(marker)?;
    let game = &filename[..idx];
    if game.is_empty() {
        return None;
    }
    let rest = &filename[idx + marker.len()..];
    let date_str = rest.get(..10)?;
    let numbering = rest.get(10..)?;
    let date: NaiveDate = date_str.parse().ok()?;
    // Require the " #{n}.{ext}" tail so stray files don't masquerade as sessions.
    let digits = numbering.strip_prefix(" #")?;
    let number: &str = digits.split('.').next()?;
    number.parse::<u32>().ok()?;
    Some((game.to_string(), date))
}

/// Scans every week folder under `organized_root` and returns all session
/// recordings found, in no particular order. Unreadable entries and files
/// that don't follow the session naming are silently skipped.
pub fn scan_recordings(organized_root: &Path) -> Vec<RecordingInfo> {
    let mut out = Vec::new();
    let Ok(week_dirs) = fs::read_dir(organized_root) else {
        return out;
    };
    for week_dir in week_dirs.flatten() {
        let dir_path = week_dir.path();
        if !dir_path.is_dir() {
            continue;
        }
        let Ok(files) = fs::read_dir(&dir_path) else {
            continue;
        };
        for file in files.flatten() {
            let path = file.path();
            if !is_video_file(&path) {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((game_name, session_date)) = parse_session_filename(filename) else {
                continue;
            };
            let Ok(metadata) = file.metadata() else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            out.push(RecordingInfo {
                filename: filename.to_string(),
                path,
                game_name,
                session_date,
                size_bytes: metadata.len(),
                modified,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizer::{session_file_name, week_folder_name};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    // ── parse_session_filename ────────────────────────────────────────────────

    #[test]
    fn parses_well_formed_session_name() {
        let (game, d) = parse_session_filename("Foo Session 2024-01-04 #3.mp4").unwrap();
        assert_eq!(game, "Foo");
        assert_eq!(d, date("2024-01-04"));
    }

    #[test]
    fn game_names_containing_session_word_use_last_occurrence() {
        let (game, d) =
            parse_session_filename("My Session Game Session 2024-01-04 #1.mkv").unwrap();
        assert_eq!(game, "My Session Game");
        assert_eq!(d, date("2024-01-04"));
    }

    #[test]
    fn rejects_names_without_numbering_tail() {
        assert!(parse_session_filename("Foo Session 2024-01-04.mp4").is_none());
        assert!(parse_session_filename("Foo Session 2024-01-04 #x.mp4").is_none());
    }

    #[test]
    fn rejects_bad_dates_and_missing_game() {
        assert!(parse_session_filename("Foo Session 2024-13-99 #1.mp4").is_none());
        assert!(parse_session_filename(" Session 2024-01-04 #1.mp4").is_none());
        assert!(parse_session_filename("random-backend-name.mp4").is_none());
    }

    // ── scan_recordings ───────────────────────────────────────────────────────

    #[test]
    fn scan_finds_sessions_and_skips_foreign_files() {
        let root = tempfile::tempdir().unwrap();
        let d = date("2024-01-04");
        let week = root.path().join(week_folder_name("Foo", d));
        std::fs::create_dir_all(&week).unwrap();
        std::fs::write(week.join(session_file_name("Foo", d, 1, "mp4")), b"v").unwrap();
        std::fs::write(week.join(session_file_name("Foo", d, 2, "mkv")), b"vv").unwrap();
        std::fs::write(week.join("thumbnail.png"), b"img").unwrap();
        std::fs::write(week.join("leftover.mp4"), b"not a session").unwrap();

        let mut recs = scan_recordings(root.path());
        recs.sort_by(|a, b| a.filename.cmp(&b.filename));
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.game_name == "Foo" && r.session_date == d));
        assert_eq!(recs[1].size_bytes, 2);
    }

    #[test]
    fn scan_of_missing_root_is_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(scan_recordings(&root.path().join("gone")).is_empty());
    }
}
