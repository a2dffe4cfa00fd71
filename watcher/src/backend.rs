//! Discovery of the recording backend's output folder.
//!
//! The backend (OBS) is a black box whose only contract with this engine is
//! "poll the state file and react". Where it writes finished recordings is
//! read from its own configuration once at startup: each OBS profile carries
//! a `basic.ini` with `RecFilePath` (advanced output mode) or `FilePath`
//! (simple output mode). If no configured folder exists on disk, the
//! per-user Videos directory is used as a fallback search root.
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the folder the backend writes recordings into.
pub fn discover_output_folder() -> PathBuf {
    if let Some(root) = obs_config_root() {
        if let Some(folder) = output_folder_from_profiles(&root) {
            return folder;
        }
    }
    default_videos_dir()
}

#[cfg(windows)]
fn obs_config_root() -> Option<PathBuf> {
    let appdata = std::env::var("APPDATA").ok()?;
    Some(PathBuf::from(appdata).join("obs-studio"))
}

#[cfg(not(windows))]
fn obs_config_root() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config").join("obs-studio"))
}

/// Scans `<config_root>/basic/profiles/*/basic.ini` and returns the first
/// configured recording folder that exists on disk.
pub fn output_folder_from_profiles(config_root: &Path) -> Option<PathBuf> {
    let profiles_dir = config_root.join("basic").join("profiles");
    let entries = fs::read_dir(&profiles_dir).ok()?;

    let mut profiles: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    // Deterministic order across platforms.
    profiles.sort();

    for profile in profiles {
        let ini_path = profile.join("basic.ini");
        let Ok(content) = fs::read_to_string(&ini_path) else {
            continue;
        };
        if let Some(raw) = record_path_from_ini(&content) {
            let folder = PathBuf::from(raw);
            if folder.is_dir() {
                return Some(folder);
            }
            eprintln!(
                "[backend] Configured output folder {} does not exist ({})",
                folder.display(),
                ini_path.display()
            );
        }
    }
    None
}

/// Extracts the recording folder from a profile `basic.ini`.
/// `RecFilePath` (advanced output) takes precedence over `FilePath` (simple).
fn record_path_from_ini(content: &str) -> Option<String> {
    let mut simple: Option<String> = None;
    for line in content.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "RecFilePath" => return Some(value.to_string()),
            "FilePath" => simple = Some(value.to_string()),
            _ => {}
        }
    }
    simple
}

/// Per-user Videos directory, the backend's own default output location.
fn default_videos_dir() -> PathBuf {
    #[cfg(windows)]
    let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
    #[cfg(not(windows))]
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join("Videos")
}
