//! Clip markers: timestamped bookmarks dropped with the hotkey while
//! recording, and their correlation against finished recordings.
//!
//! The marker document is append-only in spirit: entries keep insertion
//! order, are immutable once written, and are deleted individually by exact
//! game + timestamp match. Every write replaces the file atomically because
//! the hotkey listener and the correlator can touch it concurrently; a
//! momentarily missing file means "no markers yet".
use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::doc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMarker {
    pub game_name: String,
    /// Epoch seconds at the moment the hotkey was pressed.
    pub timestamp: i64,
    /// RFC 3339 creation time, for display only.
    pub created_at: String,
}

/// Root of markers.toml: an ordered `[[markers]]` array.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MarkerLog {
    #[serde(default)]
    pub markers: Vec<ClipMarker>,
}

impl MarkerLog {
    /// Loads the marker document. Missing file ⇒ empty log; a malformed file
    /// is logged and also treated as empty rather than blocking markers.
    pub fn load(path: &Path) -> Self {
        match doc::read_or_default(path) {
            Ok(log) => log,
            Err(e) => {
                eprintln!("[marker] {e} (treating as empty)");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        doc::write_atomic(path, &toml::to_string_pretty(self)?)
    }
}

/// Appends a marker for `game` at `timestamp` and persists the log.
pub fn append_marker(path: &Path, game: &str, timestamp: i64) -> Result<ClipMarker> {
    let marker = ClipMarker {
        game_name: game.to_string(),
        timestamp,
        created_at: Local::now().to_rfc3339(),
    };
    let mut log = MarkerLog::load(path);
    log.markers.push(marker.clone());
    log.save(path)?;
    Ok(marker)
}

/// Removes every marker matching `game` + `timestamp` exactly.
/// Returns whether anything was removed.
pub fn remove_marker(path: &Path, game: &str, timestamp: i64) -> Result<bool> {
    let mut log = MarkerLog::load(path);
    let len_before = log.markers.len();
    log.markers
        .retain(|m| !(m.game_name == game && m.timestamp == timestamp));
    if log.markers.len() == len_before {
        return Ok(false);
    }
    log.save(path)?;
    Ok(true)
}

/// A marker that fell inside a recording, positioned relative to its start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerHit {
    /// Seconds from the start of the recording.
    pub position: i64,
    /// The marker's original epoch timestamp.
    pub timestamp: i64,
}

/// Computes which markers fall inside a recording whose file modification
/// time (assumed to be end-of-recording) is `recording_mtime` and whose
/// length is `duration` seconds. The window is `[mtime - duration, mtime]`,
/// inclusive on both ends; game names must match exactly. Output is sorted
/// ascending by position. An unknown duration (probe failed) yields no hits
/// rather than a guessed window.
pub fn correlate(
    markers: &[ClipMarker],
    game: &str,
    recording_mtime: i64,
    duration: Option<f64>,
) -> Vec<MarkerHit> {
    let Some(duration) = duration else {
        return Vec::new();
    };
    let window_start = recording_mtime - duration.round() as i64;

    let mut hits: Vec<MarkerHit> = markers
        .iter()
        .filter(|m| {
            m.game_name == game && m.timestamp >= window_start && m.timestamp <= recording_mtime
        })
        .map(|m| MarkerHit {
            position: m.timestamp - window_start,
            timestamp: m.timestamp,
        })
        .collect();
    hits.sort_by_key(|h| h.position);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(game: &str, timestamp: i64) -> ClipMarker {
        ClipMarker {
            game_name: game.to_string(),
            timestamp,
            created_at: "2024-01-01T12:00:00+00:00".to_string(),
        }
    }

    // ── correlate ─────────────────────────────────────────────────────────────

    #[test]
    fn marker_inside_window_gets_relative_position() {
        // Window [950, 1100]; marker at 1000 sits 50 seconds in.
        let markers = [marker("X", 1000)];
        let hits = correlate(&markers, "X", 1100, Some(150.0));
        assert_eq!(hits, [MarkerHit { position: 50, timestamp: 1000 }]);
    }

    #[test]
    fn marker_before_window_is_excluded() {
        let markers = [marker("X", 900)];
        assert!(correlate(&markers, "X", 1100, Some(150.0)).is_empty());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let markers = [marker("X", 950), marker("X", 1100)];
        let hits = correlate(&markers, "X", 1100, Some(150.0));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 150);
    }

    #[test]
    fn game_name_must_match_exactly() {
        let markers = [marker("X", 1000), marker("x", 1000), marker("Y", 1000)];
        let hits = correlate(&markers, "X", 1100, Some(150.0));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn hits_are_sorted_by_position_regardless_of_log_order() {
        let markers = [marker("X", 1090), marker("X", 960), marker("X", 1010)];
        let hits = correlate(&markers, "X", 1100, Some(150.0));
        let positions: Vec<i64> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, [10, 60, 140]);
    }

    #[test]
    fn unknown_duration_yields_no_hits() {
        let markers = [marker("X", 1000)];
        assert!(correlate(&markers, "X", 1100, None).is_empty());
    }

    // ── store ─────────────────────────────────────────────────────────────────

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = MarkerLog::load(&dir.path().join("markers.toml"));
        assert!(log.markers.is_empty());
    }

    #[test]
    fn append_persists_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.toml");
        append_marker(&path, "Foo", 200).unwrap();
        append_marker(&path, "Foo", 100).unwrap();

        let log = MarkerLog::load(&path);
        let timestamps: Vec<i64> = log.markers.iter().map(|m| m.timestamp).collect();
        // Append order, not time-sorted.
        assert_eq!(timestamps, [200, 100]);
    }

    #[test]
    fn append_records_game_and_rfc3339_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.toml");
        let m = append_marker(&path, "Foo", 123).unwrap();
        assert_eq!(m.game_name, "Foo");
        assert!(
            chrono::DateTime::parse_from_rfc3339(&m.created_at).is_ok(),
            "created_at not RFC 3339: {}",
            m.created_at
        );
    }

    #[test]
    fn remove_matches_exact_game_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.toml");
        append_marker(&path, "Foo", 100).unwrap();
        append_marker(&path, "Bar", 100).unwrap();

        assert!(remove_marker(&path, "Foo", 100).unwrap());
        let log = MarkerLog::load(&path);
        assert_eq!(log.markers.len(), 1);
        assert_eq!(log.markers[0].game_name, "Bar");
    }

    #[test]
    fn remove_nonexistent_marker_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.toml");
        append_marker(&path, "Foo", 100).unwrap();
        assert!(!remove_marker(&path, "Foo", 999).unwrap());
    }

    #[test]
    fn malformed_document_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.toml");
        std::fs::write(&path, "markers = ][[ nope").unwrap();
        assert!(MarkerLog::load(&path).markers.is_empty());
    }
}
