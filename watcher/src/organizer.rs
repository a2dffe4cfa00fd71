//! Recording organizer: after a session ends, move whatever the backend
//! produced into the dated archive.
//!
//! The backend's file naming is not under our control, so new output is
//! found by diffing a before/after snapshot of the watched folder rather
//! than by predicting names. Destination layout:
//!
//!   `{root}/{game} - Week of {Monday}/{game} Session {YYYY-MM-DD} #{n}.{ext}`
//!
//! where `n` is max(existing numbers for that game and date) + 1, recomputed
//! from disk each time so manual edits to the archive are tolerated. Under
//! true concurrency the scan-then-move window can hand out a duplicate
//! number; accepted for a single-watcher design.
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Weekday};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// File extensions treated as backend video output.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "flv", "avi", "ts", "m4v"];

/// Filesystem timestamp jitter absorbed before a file counts as "changed".
pub const MTIME_TOLERANCE: Duration = Duration::from_secs(2);

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            VIDEO_EXTENSIONS.iter().any(|v| *v == ext)
        })
}

/// Maps every video file in `folder` (non-recursive) to its modification
/// time. Taken when recording starts; diffed against a re-scan when it ends.
pub fn snapshot_folder(folder: &Path) -> Result<HashMap<PathBuf, SystemTime>> {
    let mut snapshot = HashMap::new();
    let entries = fs::read_dir(folder)
        .with_context(|| format!("Failed to read watched folder {}", folder.display()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !is_video_file(&path) {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            snapshot.insert(path, modified);
        }
    }
    Ok(snapshot)
}

/// Expands `%VAR%`-style environment variables embedded in configured paths.
pub fn expand_env(s: &str) -> String {
    let mut result = s.to_string();
    for var in &["USERPROFILE", "APPDATA", "LOCALAPPDATA", "HOME", "TEMP", "TMP"] {
        if let Ok(val) = std::env::var(var) {
            result = result.replace(&format!("%{var}%"), &val);
        }
    }
    result
}

/// Replaces characters that are illegal in Windows path components with `_`.
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}

/// `{game} - Week of {YYYY-MM-DD}` with the date pinned to Monday of
/// `date`'s week, grouping all of that week's sessions.
pub fn week_folder_name(game: &str, date: NaiveDate) -> String {
    let monday = date.week(Weekday::Mon).first_day();
    format!(
        "{} - Week of {}",
        sanitize_component(game),
        monday.format("%Y-%m-%d")
    )
}

/// `{game} Session {YYYY-MM-DD} #{n}.{ext}`
pub fn session_file_name(game: &str, date: NaiveDate, number: u32, ext: &str) -> String {
    format!(
        "{} Session {} #{}.{}",
        sanitize_component(game),
        date.format("%Y-%m-%d"),
        number,
        ext
    )
}

/// Smallest free sequential number for files named `{prefix}{n}.{ext}` in
/// `dir`: max(existing) + 1, starting at 1. Shared with clip naming.
pub fn next_number_for_prefix(dir: &Path, prefix: &str) -> u32 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 1;
    };
    let max = entries
        .flatten()
        .filter_map(|e| e.file_name().into_string().ok())
        .filter_map(|name| number_suffix(&name, prefix))
        .max()
        .unwrap_or(0);
    max + 1
}

/// Parses `n` out of `{prefix}{n}.{ext}`.
fn number_suffix(filename: &str, prefix: &str) -> Option<u32> {
    let rest = filename.strip_prefix(prefix)?;
    let digits: &str = rest.split('.').next()?;
    digits.parse().ok()
}

/// Reconciles the watched folder against `before` and archives every new or
/// changed video file under `dest_root`. Returns one result per candidate
/// file; an individual move failure never aborts the remaining files.
pub fn organize(
    before: &HashMap<PathBuf, SystemTime>,
    folder: &Path,
    game: &str,
    dest_root: &Path,
) -> Vec<Result<PathBuf>> {
    let after = match snapshot_folder(folder) {
        Ok(s) => s,
        Err(e) => return vec![Err(e)],
    };

    let mut candidates: Vec<(&PathBuf, &SystemTime)> = after
        .iter()
        .filter(|(path, modified)| match before.get(*path) {
            None => true,
            Some(old) => **modified > *old + MTIME_TOLERANCE,
        })
        .collect();
    candidates.sort_by_key(|(path, _)| (*path).clone());

    candidates
        .into_iter()
        .map(|(path, modified)| archive_file(path, *modified, game, dest_root))
        .collect()
}

/// Moves one recording into its week folder under the next session number.
fn archive_file(
    source: &Path,
    modified: SystemTime,
    game: &str,
    dest_root: &Path,
) -> Result<PathBuf> {
    // The file's own modification date decides its week and session date.
    let date = DateTime::<Local>::from(modified).date_naive();

    let week_dir = dest_root.join(week_folder_name(game, date));
    fs::create_dir_all(&week_dir)
        .with_context(|| format!("Failed to create week folder {}", week_dir.display()))?;

    let prefix = format!(
        "{} Session {} #",
        sanitize_component(game),
        date.format("%Y-%m-%d")
    );
    let number = next_number_for_prefix(&week_dir, &prefix);
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    let dest = week_dir.join(session_file_name(game, date, number, ext));

    move_file(source, &dest)
        .with_context(|| format!("Failed to move {} to {}", source.display(), dest.display()))?;
    Ok(dest)
}

/// Rename, with a copy+delete fallback when the archive sits on a different
/// filesystem than the backend's output folder.
fn move_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, dest)?;
            fs::remove_file(source)
        }
    }
}
