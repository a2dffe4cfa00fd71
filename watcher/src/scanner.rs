//! Activity Scanner: what is on screen and what is running, right now.
//!
//! Host window/process enumeration sits behind the [`Scanner`] trait so the
//! detection engine stays a pure function over a snapshot. The live
//! implementation uses `sysinfo` for the process table and, on Windows,
//! `EnumWindows` for visible top-level window titles. Non-Windows builds see
//! an empty window list; detection then matches on process names only.
use std::collections::HashMap;
use sysinfo::{ProcessesToUpdate, System};

/// A visible top-level window and its owning process.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub title: String,
    pub pid: u32,
}

/// One poll's view of the host. Pure data, no handles.
#[derive(Debug, Clone, Default)]
pub struct ActivitySnapshot {
    pub windows: Vec<WindowInfo>,
    /// pid → executable name.
    pub processes: HashMap<u32, String>,
}

impl ActivitySnapshot {
    /// Executable name of the process owning `pid`, if it was seen.
    pub fn process_name(&self, pid: u32) -> Option<&str> {
        self.processes.get(&pid).map(String::as_str)
    }
}

pub trait Scanner {
    fn snapshot(&mut self) -> ActivitySnapshot;
}

/// Live scanner backed by the OS.
pub struct SystemScanner {
    sys: System,
}

impl SystemScanner {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl Scanner for SystemScanner {
    fn snapshot(&mut self) -> ActivitySnapshot {
        self.sys.refresh_processes(ProcessesToUpdate::All, false);

        let processes = self
            .sys
            .processes()
            .iter()
            .map(|(pid, p)| (pid.as_u32(), p.name().to_string_lossy().into_owned()))
            .collect();

        #[cfg(windows)]
        let windows = imp::list_windows();
        #[cfg(not(windows))]
        let windows = Vec::new();

        ActivitySnapshot { windows, processes }
    }
}

// ── Windows window enumeration ────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use super::WindowInfo;
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, TRUE};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
        IsWindowVisible,
    };

    /// `EnumWindows` callback. `lparam` carries the output `Vec<WindowInfo>`.
    /// Only visible windows with a non-empty title are reported, matching
    /// what a user could actually see on screen.
    unsafe extern "system" fn enum_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let out = &mut *(lparam.0 as *mut Vec<WindowInfo>);
        if IsWindowVisible(hwnd).as_bool() {
            let len = GetWindowTextLengthW(hwnd);
            if len > 0 {
                let mut buf = vec![0u16; len as usize + 1];
                let copied = GetWindowTextW(hwnd, &mut buf);
                if copied > 0 {
                    let title = String::from_utf16_lossy(&buf[..copied as usize]);
                    let mut pid = 0u32;
                    GetWindowThreadProcessId(hwnd, Some(&mut pid));
                    out.push(WindowInfo { title, pid });
                }
            }
        }
        TRUE
    }

    pub fn list_windows() -> Vec<WindowInfo> {
        let mut out: Vec<WindowInfo> = Vec::new();
        unsafe {
            // EnumWindows reports an error if the callback ever returns FALSE;
            // ours never does, so the result is ignored.
            let _ = EnumWindows(Some(enum_proc), LPARAM(&mut out as *mut _ as isize));
        }
        out
    }
}
