//! Watcher settings: organizer, marker hotkey, auto-clip, and external-tool
//! locations. Written by the GUI, hot-reloaded here independently of the game
//! registry.
use serde::Deserialize;

pub const DEFAULT_HOTKEY: &str = "F9";
/// `%USERPROFILE%` / `$HOME` are expanded at use time by the organizer.
#[cfg(windows)]
pub const DEFAULT_ORGANIZED_ROOT: &str = r"%USERPROFILE%\Videos\Reelkeeper";
#[cfg(not(windows))]
pub const DEFAULT_ORGANIZED_ROOT: &str = "%HOME%/Videos/Reelkeeper";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub organizer: OrganizerSettings,
    #[serde(default)]
    pub hotkey: HotkeySettings,
    #[serde(default)]
    pub auto_clip: AutoClipSettings,
    #[serde(default)]
    pub tools: ToolSettings,
}

/// Where finished recordings are archived, and whether that happens at all.
#[derive(Debug, Deserialize, Clone)]
pub struct OrganizerSettings {
    #[serde(default = "default_organized_root")]
    pub organized_root: String,
    #[serde(default = "default_true")]
    pub auto_organize: bool,
}

impl Default for OrganizerSettings {
    fn default() -> Self {
        Self {
            organized_root: default_organized_root(),
            auto_organize: true,
        }
    }
}

/// The marker hotkey pressed while recording to bookmark a moment.
#[derive(Debug, Deserialize, Clone)]
pub struct HotkeySettings {
    #[serde(default = "default_hotkey")]
    pub key: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl HotkeySettings {
    /// Key name handed to the hook; an empty name disables the hook without
    /// tearing it down.
    pub fn effective_key(&self) -> &str {
        if self.enabled {
            &self.key
        } else {
            ""
        }
    }
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            key: default_hotkey(),
            enabled: true,
        }
    }
}

/// Automatic clip extraction around markers after a session is organized.
#[derive(Debug, Deserialize, Clone)]
pub struct AutoClipSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Seconds of footage kept before the marked moment.
    #[serde(default = "default_pre_seconds")]
    pub pre_seconds: f64,
    /// Seconds of footage kept after the marked moment.
    #[serde(default = "default_post_seconds")]
    pub post_seconds: f64,
}

impl Default for AutoClipSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            pre_seconds: default_pre_seconds(),
            post_seconds: default_post_seconds(),
        }
    }
}

/// External transcoding tools, invoked as black-box commands.
#[derive(Debug, Deserialize, Clone)]
pub struct ToolSettings {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hotkey() -> String {
    DEFAULT_HOTKEY.to_string()
}

fn default_organized_root() -> String {
    DEFAULT_ORGANIZED_ROOT.to_string()
}

fn default_pre_seconds() -> f64 {
    20.0
}

fn default_post_seconds() -> f64 {
    10.0
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}
