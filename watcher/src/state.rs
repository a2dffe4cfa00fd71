//! Published watcher state: the single source of truth the recording backend
//! polls to decide whether it should be recording.
//!
//! Wire format is one line:
//!   `IDLE` | `RECORDING|<game>` | `RECORDING|<game>|<scene_hint>` | `STOPPED`
//! The file is always replaced atomically so the backend sees either the old
//! complete line or the new complete line, and must tolerate the file being
//! momentarily absent.
use anyhow::Result;
use std::path::Path;

use crate::doc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Recording {
        game: String,
        scene_hint: Option<String>,
    },
    Stopped,
}

impl WatcherState {
    pub fn recording(game: impl Into<String>, scene_hint: Option<String>) -> Self {
        Self::Recording { game: game.into(), scene_hint }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Name of the game being recorded, if any.
    pub fn game(&self) -> Option<&str> {
        match self {
            Self::Recording { game, .. } => Some(game),
            _ => None,
        }
    }

    pub fn to_line(&self) -> String {
        match self {
            Self::Idle => "IDLE".to_string(),
            Self::Stopped => "STOPPED".to_string(),
            Self::Recording { game, scene_hint: None } => format!("RECORDING|{game}"),
            Self::Recording { game, scene_hint: Some(scene) } => {
                format!("RECORDING|{game}|{scene}")
            }
        }
    }

    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        match line {
            "IDLE" => return Some(Self::Idle),
            "STOPPED" => return Some(Self::Stopped),
            _ => {}
        }
        let mut parts = line.splitn(3, '|');
        if parts.next()? != "RECORDING" {
            return None;
        }
        let game = parts.next()?;
        if game.is_empty() {
            return None;
        }
        Some(Self::Recording {
            game: game.to_string(),
            scene_hint: parts.next().map(str::to_string),
        })
    }
}

/// Atomically replaces the state file with `state`.
pub fn publish(path: &Path, state: &WatcherState) -> Result<()> {
    doc::write_atomic(path, &format!("{}\n", state.to_line()))
}

/// Reads the currently published state. A missing or unparseable file is
/// treated as "no state published".
pub fn read(path: &Path) -> Option<WatcherState> {
    let content = std::fs::read_to_string(path).ok()?;
    WatcherState::parse_line(&content)
}
