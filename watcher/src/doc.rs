//! File-based IPC primitives shared by every document this engine touches.
//!
//! Two patterns, used identically for the registry, settings, markers, and
//! the state file:
//!   - [`write_atomic`]: write a sibling temp file, then rename it over the
//!     canonical path. A concurrent reader sees either the previous complete
//!     contents or the new complete contents, never a partial write.
//!   - [`TrackedDoc`]: hot reload by modification-time polling. The held
//!     value is replaced only when the backing file's mtime changes and the
//!     new contents parse; otherwise the last-known-good value survives.
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Atomically replaces the file at `path` with `contents`.
///
/// Creates the parent directory if needed. The temp file lives next to the
/// target so the rename never crosses a filesystem boundary.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Reads and parses a TOML document, treating a missing file as "no data yet".
pub fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// A TOML document owned by another process, re-read when its modification
/// time changes.
pub struct TrackedDoc<T> {
    path: PathBuf,
    mtime: Option<SystemTime>,
    value: T,
}

impl<T: DeserializeOwned + Default> TrackedDoc<T> {
    /// Performs the initial load. A read or parse failure is logged and the
    /// document starts out as `T::default()`.
    pub fn load(path: PathBuf) -> Self {
        let mtime = file_mtime(&path);
        let value = match read_or_default(&path) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("[doc] {e} (starting with defaults)");
                T::default()
            }
        };
        Self { path, mtime, value }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Re-reads the document if the file's mtime differs from the last check.
    /// Returns `true` when the held value was replaced. A file that fails to
    /// parse leaves the previous value in place (its mtime is still recorded
    /// so a broken file is not re-parsed every tick).
    pub fn reload_if_changed(&mut self) -> bool {
        let mtime = file_mtime(&self.path);
        if mtime == self.mtime {
            return false;
        }
        self.mtime = mtime;
        match read_or_default(&self.path) {
            Ok(v) => {
                self.value = v;
                true
            }
            Err(e) => {
                eprintln!("[doc] {e} (keeping previous value)");
                false
            }
        }
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    struct Sample {
        #[serde(default)]
        name: String,
        #[serde(default)]
        count: u32,
    }

    // ── write_atomic ──────────────────────────────────────────────────────────

    #[test]
    fn write_atomic_creates_file_with_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.txt");
        write_atomic(&path, "IDLE\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "IDLE\n");
    }

    #[test]
    fn write_atomic_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("state.txt");
        write_atomic(&path, "IDLE\n").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_atomic_replaces_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.txt");
        write_atomic(&path, "IDLE\n").unwrap();
        write_atomic(&path, "RECORDING|Foo\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "RECORDING|Foo\n");
    }

    #[test]
    fn write_atomic_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.txt");
        write_atomic(&path, "IDLE\n").unwrap();
        assert!(!path.with_extension("tmp").exists());
    }

    // ── read_or_default ───────────────────────────────────────────────────────

    #[test]
    fn read_or_default_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let value: Sample = read_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(value, Sample::default());
    }

    #[test]
    fn read_or_default_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "not valid ][[[").unwrap();
        assert!(read_or_default::<Sample>(&path).is_err());
    }

    // ── TrackedDoc ────────────────────────────────────────────────────────────

    #[test]
    fn tracked_doc_initial_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        fs::write(&path, "name = \"foo\"\ncount = 3\n").unwrap();
        let doc: TrackedDoc<Sample> = TrackedDoc::load(path);
        assert_eq!(doc.value().name, "foo");
        assert_eq!(doc.value().count, 3);
    }

    #[test]
    fn tracked_doc_missing_file_starts_default() {
        let dir = tempfile::tempdir().unwrap();
        let doc: TrackedDoc<Sample> = TrackedDoc::load(dir.path().join("nope.toml"));
        assert_eq!(*doc.value(), Sample::default());
    }

    #[test]
    fn tracked_doc_unchanged_file_does_not_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        fs::write(&path, "count = 1\n").unwrap();
        let mut doc: TrackedDoc<Sample> = TrackedDoc::load(path);
        assert!(!doc.reload_if_changed());
    }

    #[test]
    fn tracked_doc_reloads_after_mtime_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        fs::write(&path, "count = 1\n").unwrap();
        let mut doc: TrackedDoc<Sample> = TrackedDoc::load(path.clone());

        fs::write(&path, "count = 2\n").unwrap();
        // Force a visibly different mtime; some filesystems have coarse stamps.
        let later = SystemTime::now() + std::time::Duration::from_secs(10);
        let file = fs::File::options().append(true).open(&path).unwrap();
        file.set_modified(later).unwrap();

        assert!(doc.reload_if_changed());
        assert_eq!(doc.value().count, 2);
    }

    #[test]
    fn tracked_doc_keeps_last_known_good_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        fs::write(&path, "count = 7\n").unwrap();
        let mut doc: TrackedDoc<Sample> = TrackedDoc::load(path.clone());

        fs::write(&path, "count = ][[ broken").unwrap();
        let later = SystemTime::now() + std::time::Duration::from_secs(10);
        let file = fs::File::options().append(true).open(&path).unwrap();
        file.set_modified(later).unwrap();

        assert!(!doc.reload_if_changed());
        assert_eq!(doc.value().count, 7);
    }
}
