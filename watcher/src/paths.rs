//! Canonical file paths for Reelkeeper data files.
//!
//! All files live under the per-user app data directory
//! (`%APPDATA%\Reelkeeper` on Windows, `~/.config/reelkeeper` elsewhere):
//!   - games.toml     Game registry. Written by the GUI, read by the watcher.
//!   - settings.toml  Organizer/hotkey/auto-clip settings. Written by the GUI.
//!   - state.txt      Single-line watcher state. Written by the watcher,
//!                    polled by the recording backend.
//!   - markers.toml   Clip markers appended while recording.
//!   - watcher.pid    Single-instance guard record.
use std::path::PathBuf;

#[cfg(windows)]
const APP_DIR_NAME: &str = "Reelkeeper";
#[cfg(not(windows))]
const APP_DIR_NAME: &str = "reelkeeper";

pub const GAMES_FILE_NAME: &str = "games.toml";
pub const SETTINGS_FILE_NAME: &str = "settings.toml";
pub const STATE_FILE_NAME: &str = "state.txt";
pub const MARKERS_FILE_NAME: &str = "markers.toml";
pub const PID_FILE_NAME: &str = "watcher.pid";

/// Returns the Reelkeeper application data directory.
#[cfg(windows)]
pub fn app_data_dir() -> PathBuf {
    let appdata = std::env::var("APPDATA").expect("APPDATA environment variable not set");
    PathBuf::from(appdata).join(APP_DIR_NAME)
}

/// Returns the Reelkeeper application data directory.
#[cfg(not(windows))]
pub fn app_data_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join(APP_DIR_NAME);
    }
    let home = std::env::var("HOME").expect("HOME environment variable not set");
    PathBuf::from(home).join(".config").join(APP_DIR_NAME)
}

pub fn games_file_path() -> PathBuf {
    app_data_dir().join(GAMES_FILE_NAME)
}

pub fn settings_file_path() -> PathBuf {
    app_data_dir().join(SETTINGS_FILE_NAME)
}

pub fn state_file_path() -> PathBuf {
    app_data_dir().join(STATE_FILE_NAME)
}

pub fn markers_file_path() -> PathBuf {
    app_data_dir().join(MARKERS_FILE_NAME)
}

pub fn pid_file_path() -> PathBuf {
    app_data_dir().join(PID_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_files_share_same_parent_dir() {
        let parent = app_data_dir();
        for path in [
            games_file_path(),
            settings_file_path(),
            state_file_path(),
            markers_file_path(),
            pid_file_path(),
        ] {
            assert_eq!(path.parent().unwrap(), parent.as_path());
        }
    }

    #[test]
    fn file_names_match_constants() {
        assert_eq!(games_file_path().file_name().unwrap(), GAMES_FILE_NAME);
        assert_eq!(settings_file_path().file_name().unwrap(), SETTINGS_FILE_NAME);
        assert_eq!(state_file_path().file_name().unwrap(), STATE_FILE_NAME);
        assert_eq!(markers_file_path().file_name().unwrap(), MARKERS_FILE_NAME);
        assert_eq!(pid_file_path().file_name().unwrap(), PID_FILE_NAME);
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        let dir = app_data_dir();
        assert_eq!(dir.file_name().unwrap(), APP_DIR_NAME);
    }
}
