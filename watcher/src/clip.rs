//! Clip extraction and re-encoding via the external transcoding tool.
//!
//! The tool (ffmpeg/ffprobe, paths configurable in settings) is a black box:
//! arguments are passed through verbatim and its exit status plus stderr are
//! the only error signal. Extraction uses stream copy for speed; re-encoding
//! is the deliberate slow variant for shrinking archives.
use anyhow::{bail, ensure, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::organizer::{next_number_for_prefix, sanitize_component};
use crate::settings::ToolSettings;

/// A successfully extracted clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    pub path: PathBuf,
    /// Offset into the source recording, in seconds.
    pub start: f64,
    pub duration: f64,
}

/// Knobs for [`reencode`]. Passed to the tool verbatim.
#[derive(Debug, Clone)]
pub struct ReencodeOptions {
    /// Target video codec, e.g. `libx264` or `libx265`.
    pub codec: String,
    /// Constant rate factor (quality; lower is better).
    pub crf: u32,
    /// Encoder speed preset, e.g. `medium` or `slow`.
    pub preset: String,
}

impl Default for ReencodeOptions {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            crf: 23,
            preset: "medium".to_string(),
        }
    }
}

/// Cuts `[start, end)` seconds out of `source` into
/// `{dest_dir}/{game} Clip {today} #{n}.{ext}` using stream copy.
///
/// Rejects `end <= start` before touching the tool. On tool failure the
/// partial output file is removed and the error carries the tool's stderr.
pub fn extract(
    source: &Path,
    start: f64,
    end: f64,
    game: &str,
    dest_dir: &Path,
    tools: &ToolSettings,
) -> Result<ClipInfo> {
    ensure!(
        end > start,
        "Clip end ({end:.1}s) must be after start ({start:.1}s)"
    );
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create clip folder {}", dest_dir.display()))?;

    let prefix = format!(
        "{} Clip {} #",
        sanitize_component(game),
        Local::now().date_naive().format("%Y-%m-%d")
    );
    let number = next_number_for_prefix(dest_dir, &prefix);
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    let output_path = dest_dir.join(format!("{prefix}{number}.{ext}"));

    let duration = end - start;
    let output = Command::new(&tools.ffmpeg)
        .args(["-hide_banner", "-loglevel", "error", "-y", "-ss"])
        .arg(format!("{start}"))
        .arg("-i")
        .arg(source)
        .arg("-t")
        .arg(format!("{duration}"))
        // Stream copy: no re-encode, cuts land on the nearest keyframes.
        .args(["-c", "copy"])
        .arg(&output_path)
        .output()
        .with_context(|| format!("Failed to run {}", tools.ffmpeg))?;

    if !output.status.success() {
        let _ = fs::remove_file(&output_path);
        bail!(
            "{} exited with {}: {}",
            tools.ffmpeg,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(ClipInfo { path: output_path, start, duration })
}

/// Re-encodes `source` with the given codec/quality/preset, copying audio.
///
/// Writes `{stem} (reencoded).{ext}` next to the source; with `replace` the
/// source is swapped out by remove-then-rename and its own path is returned.
pub fn reencode(
    source: &Path,
    options: &ReencodeOptions,
    replace: bool,
    tools: &ToolSettings,
) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Source file has no usable name")?;
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    let output_path = source.with_file_name(format!("{stem} (reencoded).{ext}"));

    let output = Command::new(&tools.ffmpeg)
        .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
        .arg(source)
        .args(["-c:v", &options.codec])
        .args(["-crf", &options.crf.to_string()])
        .args(["-preset", &options.preset])
        .args(["-c:a", "copy"])
        .arg(&output_path)
        .output()
        .with_context(|| format!("Failed to run {}", tools.ffmpeg))?;

    if !output.status.success() {
        let _ = fs::remove_file(&output_path);
        bail!(
            "{} exited with {}: {}",
            tools.ffmpeg,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    if replace {
        fs::remove_file(source)
            .with_context(|| format!("Failed to remove original {}", source.display()))?;
        fs::rename(&output_path, source)
            .with_context(|| format!("Failed to replace {}", source.display()))?;
        return Ok(source.to_path_buf());
    }
    Ok(output_path)
}

/// Asks ffprobe for the container duration in seconds.
/// Any failure (tool missing, nonzero exit, unparseable output) is `None`.
pub fn probe_duration(path: &Path, tools: &ToolSettings) -> Option<f64> {
    let output = Command::new(&tools.ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}
