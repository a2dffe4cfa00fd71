//! The watcher loop: a fixed-interval poll that drives detection, publishes
//! state transitions, and runs the end-of-session pipeline (settle →
//! organize → auto-clip).
//!
//! Single-threaded by design. Organization and clip extraction run inline
//! and pause detection while they work; they happen once per session, so the
//! polling cadence is unaffected in steady state.
use chrono::Local;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::clip;
use crate::detect::detect;
use crate::doc::TrackedDoc;
use crate::event::WatcherEvent;
use crate::hotkey::HotkeyHandle;
use crate::markers::{self, MarkerLog};
use crate::organizer;
use crate::registry::GameRegistry;
use crate::scanner::Scanner;
use crate::settings::Settings;
use crate::state::{self, WatcherState};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Pause between detecting the end of a session and scanning the backend's
/// output folder, so a file still being flushed is not picked up mid-write.
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);

pub struct Watcher<S: Scanner> {
    scanner: S,
    registry: TrackedDoc<GameRegistry>,
    settings: TrackedDoc<Settings>,
    state_path: PathBuf,
    markers_path: PathBuf,
    /// The backend's output folder, discovered once at startup.
    watch_folder: PathBuf,
    /// Last state successfully written to the state file. `None` until the
    /// first write lands, so a failed publish is retried next tick.
    published: Option<WatcherState>,
    /// Watched-folder snapshot taken when recording started; consumed by the
    /// organizer when it ends.
    pre_snapshot: Option<HashMap<PathBuf, SystemTime>>,
    hotkey: Option<HotkeyHandle>,
}

impl<S: Scanner> Watcher<S> {
    pub fn new(
        scanner: S,
        registry: TrackedDoc<GameRegistry>,
        settings: TrackedDoc<Settings>,
        state_path: PathBuf,
        markers_path: PathBuf,
        watch_folder: PathBuf,
    ) -> Self {
        Self {
            scanner,
            registry,
            settings,
            state_path,
            markers_path,
            watch_folder,
            published: None,
            pre_snapshot: None,
            hotkey: None,
        }
    }

    pub fn with_hotkey(mut self, handle: HotkeyHandle) -> Self {
        self.hotkey = Some(handle);
        self
    }

    /// Runs until a [`WatcherEvent::Shutdown`] arrives (or the event channel
    /// closes), then publishes `STOPPED` on the way out.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<WatcherEvent>) {
        // Idle is published immediately on startup, before the first poll.
        self.transition_to(WatcherState::Idle).await;

        let mut ticker = interval(POLL_INTERVAL);
        // Organization can take longer than the poll interval; don't burst
        // catch-up ticks afterwards.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                event = events.recv() => match event {
                    Some(WatcherEvent::MarkerRequested) => self.record_marker(),
                    Some(WatcherEvent::Shutdown) | None => break,
                },
            }
        }

        println!("[watch] Shutting down");
        // Published exactly once; an in-flight session is still organized.
        self.transition_to(WatcherState::Stopped).await;
    }

    /// Tears down the hotkey hook thread, if one was attached.
    pub fn stop_hotkey(&mut self) {
        if let Some(handle) = self.hotkey.take() {
            handle.stop();
        }
    }

    /// One poll: hot-reload documents, detect, and publish on change.
    /// Identical consecutive detections publish nothing and trigger nothing.
    async fn tick(&mut self) {
        self.registry.reload_if_changed();
        if self.settings.reload_if_changed() {
            println!("[watch] Settings reloaded");
            if let Some(handle) = &self.hotkey {
                handle.update_key(self.settings.value().hotkey.effective_key());
            }
        }

        let snapshot = self.scanner.snapshot();
        let candidate = match detect(&self.registry.value().games, &snapshot) {
            Some(game) => WatcherState::recording(game.name.clone(), game.scene_hint.clone()),
            None => WatcherState::Idle,
        };

        if self.published.as_ref() != Some(&candidate) {
            self.transition_to(candidate).await;
        }
    }

    /// Publishes `next` and runs the transition actions. If the publish
    /// fails, nothing else happens: the in-memory state is left unchanged so
    /// the next tick retries the whole transition.
    async fn transition_to(&mut self, next: WatcherState) {
        if let Err(e) = state::publish(&self.state_path, &next) {
            eprintln!("[watch] Failed to publish state: {e:#} (will retry next tick)");
            return;
        }
        println!("[watch] State: {}", next.to_line());

        let prev = self.published.replace(next.clone());
        let ended_game = prev
            .as_ref()
            .and_then(|p| p.game())
            .filter(|g| next.game() != Some(g))
            .map(str::to_string);
        if let Some(game) = ended_game {
            self.finish_session(&game).await;
        }
        if next.is_recording() && prev.as_ref().and_then(|p| p.game()) != next.game() {
            self.begin_session();
        }
    }

    /// Entering Recording: snapshot the watched folder for later diffing.
    /// An unreachable folder means this session ends without reconciliation.
    fn begin_session(&mut self) {
        match organizer::snapshot_folder(&self.watch_folder) {
            Ok(snapshot) => {
                println!(
                    "[watch] Watching {} ({} existing video file(s))",
                    self.watch_folder.display(),
                    snapshot.len()
                );
                self.pre_snapshot = Some(snapshot);
            }
            Err(e) => {
                eprintln!("[watch] {e:#}; reconciliation will be skipped for this session");
                self.pre_snapshot = None;
            }
        }
    }

    /// Leaving Recording: settle, organize, and auto-extract clips.
    async fn finish_session(&mut self, game: &str) {
        let Some(before) = self.pre_snapshot.take() else {
            eprintln!("[organize] No pre-recording snapshot for '{game}'; skipping");
            return;
        };

        // Give the backend time to finish flushing the recording.
        tokio::time::sleep(SETTLE_DELAY).await;

        let settings = self.settings.value().clone();
        if !settings.organizer.auto_organize {
            println!("[organize] Auto-organize disabled; leaving files for '{game}' in place");
            return;
        }
        let dest_root = PathBuf::from(organizer::expand_env(&settings.organizer.organized_root));

        for result in organizer::organize(&before, &self.watch_folder, game, &dest_root) {
            match result {
                Ok(dest) => {
                    println!("[organize] Archived {}", dest.display());
                    if settings.auto_clip.enabled {
                        self.auto_extract(&dest, game, &dest_root, &settings);
                    }
                }
                Err(e) => eprintln!("[organize] {e:#}"),
            }
        }
    }

    /// Extracts a clip around every marker that falls inside the archived
    /// recording, then retires those markers. Per-clip failures are logged
    /// and the remaining markers still get their clips.
    fn auto_extract(&self, recording: &Path, game: &str, dest_root: &Path, settings: &Settings) {
        let Some(duration) = clip::probe_duration(recording, &settings.tools) else {
            eprintln!(
                "[clip] Could not probe duration of {}; skipping auto-clips",
                recording.display()
            );
            return;
        };
        let mtime_secs = match fs::metadata(recording).and_then(|m| m.modified()) {
            Ok(t) => t
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0),
            Err(e) => {
                eprintln!("[clip] Cannot stat {}: {e}", recording.display());
                return;
            }
        };

        let log = MarkerLog::load(&self.markers_path);
        let hits = markers::correlate(&log.markers, game, mtime_secs, Some(duration));
        if hits.is_empty() {
            return;
        }
        println!("[clip] {} marker(s) inside {}", hits.len(), recording.display());

        let clips_dir =
            dest_root.join(format!("{} - Clips", organizer::sanitize_component(game)));
        for hit in hits {
            let start = (hit.position as f64 - settings.auto_clip.pre_seconds).max(0.0);
            let end = (hit.position as f64 + settings.auto_clip.post_seconds).min(duration);
            match clip::extract(recording, start, end, game, &clips_dir, &settings.tools) {
                Ok(info) => {
                    println!("[clip] Saved {}", info.path.display());
                    if let Err(e) = markers::remove_marker(&self.markers_path, game, hit.timestamp)
                    {
                        eprintln!("[clip] Failed to retire consumed marker: {e:#}");
                    }
                }
                Err(e) => eprintln!("[clip] {e:#}"),
            }
        }
    }

    /// Hotkey press: bookmark the current moment of the active recording.
    fn record_marker(&self) {
        match self.published.as_ref().and_then(|s| s.game()) {
            Some(game) => {
                let timestamp = Local::now().timestamp();
                match markers::append_marker(&self.markers_path, game, timestamp) {
                    Ok(m) => println!("[marker] Marked '{game}' at {}", m.timestamp),
                    Err(e) => eprintln!("[marker] {e:#}"),
                }
            }
            None => println!("[marker] Hotkey pressed but nothing is recording; ignored"),
        }
    }
}
