//! Single-instance guard.
//!
//! Advisory, not a real lock: a pid file under the app data directory records
//! the running watcher. A second instance refuses to start while a process
//! with that pid is alive; a stale record from an abnormal exit is treated as
//! "not running" and overwritten.
use anyhow::{bail, Result};
use std::fs;
use std::path::Path;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::doc;

/// Claims the instance guard, writing our pid to `pid_path`.
/// Fails only when a different live process already holds it.
pub fn acquire(pid_path: &Path) -> Result<()> {
    if let Some(existing) = read_pid(pid_path) {
        if existing != std::process::id() && process_alive(existing) {
            bail!("Another watcher instance is already running (pid {existing})");
        }
    }
    doc::write_atomic(pid_path, &format!("{}\n", std::process::id()))
}

/// Removes the guard record. Failure to remove is not worth surfacing; a
/// stale record is handled on the next start.
pub fn release(pid_path: &Path) {
    if let Err(e) = fs::remove_file(pid_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            eprintln!("[guard] Failed to remove pid file: {e}");
        }
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn process_alive(pid: u32) -> bool {
    let target = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), false);
    sys.process(target).is_some()
}
