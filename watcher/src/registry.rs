//! The game registry: the ordered list of games the watcher looks for.
//!
//! Owned by the configuration GUI and strictly read-only here. Reloaded by
//! mtime polling via [`crate::doc::TrackedDoc`]. Registry order matters:
//! detection is first-match-wins.
use serde::Deserialize;

/// A single configured game.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GameEntry {
    /// Display name, also used for archive folder and session file names.
    pub name: String,
    /// Case-insensitive substring matched against window titles and process
    /// executable names.
    pub selector: String,
    /// Optional backend scene to switch to while recording this game,
    /// forwarded verbatim in the published state line.
    pub scene_hint: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Root of games.toml: an ordered `[[games]]` array.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GameRegistry {
    #[serde(default)]
    pub games: Vec<GameEntry>,
}

fn default_enabled() -> bool {
    true
}
