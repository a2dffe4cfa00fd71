//! Global marker hotkey using a low-level Windows keyboard hook
//! (`WH_KEYBOARD_LL`).
//!
//! The hook runs on a dedicated OS thread with its own Windows message pump,
//! so it fires even when a full-screen exclusive-mode game has focus. The
//! hook thread exits cleanly when [`HotkeyHandle::stop`] is called.
//!
//! On non-Windows platforms the public API compiles but is a no-op at runtime.
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use tokio::sync::mpsc;

use crate::event::WatcherEvent;

/// Currently watched virtual-key code (0 = disabled).
/// Written by [`HotkeyHandle::update_key`]; read inside the hook callback.
static HOOK_VK: AtomicU32 = AtomicU32::new(0);

/// Channel used to forward [`WatcherEvent::MarkerRequested`] from the hook
/// callback to the watcher loop. Set once by [`start`].
static HOOK_TX: OnceLock<mpsc::Sender<WatcherEvent>> = OnceLock::new();

/// Converts a hotkey name string (e.g. `"F9"`, `"M"`) to a Windows
/// virtual-key code.
///
/// Supported keys: `F1`–`F12`, ASCII letters, and ASCII digits, all
/// case-insensitive. Returns `None` for any unrecognised name.
pub fn parse_vk(name: &str) -> Option<u32> {
    match name.to_uppercase().as_str() {
        "F1" => Some(0x70),
        "F2" => Some(0x71),
        "F3" => Some(0x72),
        "F4" => Some(0x73),
        "F5" => Some(0x74),
        "F6" => Some(0x75),
        "F7" => Some(0x76),
        "F8" => Some(0x77),
        "F9" => Some(0x78),
        "F10" => Some(0x79),
        "F11" => Some(0x7A),
        "F12" => Some(0x7B),
        s if s.len() == 1 => {
            let c = s.chars().next().unwrap();
            if c.is_ascii_alphanumeric() {
                // 'A'=0x41…'Z'=0x5A; '0'=0x30…'9'=0x39 — exact match to Windows VK codes.
                Some(c.to_ascii_uppercase() as u32)
            } else {
                None
            }
        }
        _ => None,
    }
}

// ── Public handle ─────────────────────────────────────────────────────────────

/// A handle to the running keyboard hook.
///
/// Allows re-binding the key on settings reload and stopping the hook thread
/// when the watcher exits.
pub struct HotkeyHandle {
    #[cfg(windows)]
    _thread: std::thread::JoinHandle<()>,
    /// Thread ID of the message-pump thread, used to post `WM_QUIT`.
    #[cfg(windows)]
    thread_id: u32,
}

impl HotkeyHandle {
    /// Changes the active hotkey to `hotkey_name`.
    ///
    /// Pass an unrecognised name (e.g. `""`) to disable the hotkey without
    /// stopping the hook thread.
    pub fn update_key(&self, hotkey_name: &str) {
        HOOK_VK.store(parse_vk(hotkey_name).unwrap_or(0), Ordering::Relaxed);
    }

    /// Signals the hook thread to stop and blocks until it exits.
    pub fn stop(self) {
        #[cfg(windows)]
        {
            imp::post_quit(self.thread_id);
            let _ = self._thread.join();
        }
    }
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Installs the keyboard hook on a dedicated OS thread and returns a
/// [`HotkeyHandle`] for managing it.
///
/// A press of the configured key sends [`WatcherEvent::MarkerRequested`]
/// through `tx` via a non-blocking `try_send`; a full channel silently drops
/// that press.
///
/// # Windows
/// Panics if `SetWindowsHookExW` fails.
///
/// # Non-Windows
/// Returns a stub handle; all methods compile and run but do nothing.
pub fn start(initial_hotkey: &str, tx: mpsc::Sender<WatcherEvent>) -> HotkeyHandle {
    HOOK_VK.store(parse_vk(initial_hotkey).unwrap_or(0), Ordering::Relaxed);
    // Silently ignore if called more than once (e.g. in test binaries).
    let _ = HOOK_TX.set(tx);

    #[cfg(windows)]
    {
        let (id_tx, id_rx) = std::sync::mpsc::sync_channel::<u32>(1);
        let thread = std::thread::Builder::new()
            .name("hotkey-pump".into())
            .spawn(move || imp::run_message_pump(id_tx))
            .expect("Failed to spawn hotkey thread");
        let thread_id = id_rx.recv().expect("hotkey thread did not send its ID");
        HotkeyHandle { _thread: thread, thread_id }
    }

    #[cfg(not(windows))]
    HotkeyHandle {}
}

// ── Windows implementation ────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use std::sync::atomic::Ordering;
    use std::sync::mpsc as std_mpsc;

    use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
        UnhookWindowsHookEx, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYDOWN, WM_QUIT,
    };

    use super::{HOOK_TX, HOOK_VK};
    use crate::event::WatcherEvent;

    /// Low-level keyboard hook procedure.
    ///
    /// Called by Windows on every keyboard event system-wide. We only act
    /// when `nCode >= 0` and the virtual-key code matches the configured
    /// target.
    unsafe extern "system" fn keyboard_proc(
        n_code: i32,
        w_param: WPARAM,
        l_param: LPARAM,
    ) -> LRESULT {
        if n_code >= 0 && w_param.0 as u32 == WM_KEYDOWN {
            let kb = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
            let target = HOOK_VK.load(Ordering::Relaxed);
            if target != 0 && kb.vkCode == target {
                if let Some(tx) = HOOK_TX.get() {
                    // try_send is non-blocking; a full channel silently drops this press.
                    let _ = tx.try_send(WatcherEvent::MarkerRequested);
                }
            }
        }
        CallNextHookEx(None, n_code, w_param, l_param)
    }

    /// Installs `WH_KEYBOARD_LL`, runs a Windows message pump until `WM_QUIT`,
    /// then uninstalls the hook.
    pub fn run_message_pump(id_tx: std_mpsc::SyncSender<u32>) {
        unsafe {
            let _ = id_tx.send(GetCurrentThreadId());
            drop(id_tx);

            let hook = SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), HINSTANCE::default(), 0)
                .expect("SetWindowsHookExW failed");

            let mut msg = MSG::default();
            // GetMessageW: >0 = message, 0 = WM_QUIT, <0 = error.
            while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
                DispatchMessageW(&msg);
            }

            let _ = UnhookWindowsHookEx(hook);
            eprintln!("[hotkey] Hook thread exited");
        }
    }

    /// Posts `WM_QUIT` to `thread_id`, causing its `GetMessageW` loop to exit.
    pub fn post_quit(thread_id: u32) {
        unsafe {
            let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
