//! Detection engine: which configured game, if any, is active right now.
use crate::registry::GameEntry;
use crate::scanner::ActivitySnapshot;

/// Returns the first enabled entry (in registry order) whose selector
/// substring-matches, case-insensitively, a visible window title or that
/// window's owning process executable name.
///
/// Matching is scoped to window-owning processes: a windowless background
/// process (launcher, updater, crash handler) must never count as the game
/// being on screen. Only when the snapshot carries no windows at all (hosts
/// that cannot enumerate them) does matching fall back to bare process names.
///
/// Registry order is the only tie-break; window z-order and process start
/// times are ignored. Entries with an empty selector never match.
pub fn detect<'a>(games: &'a [GameEntry], snapshot: &ActivitySnapshot) -> Option<&'a GameEntry> {
    games
        .iter()
        .filter(|g| g.enabled && !g.selector.is_empty())
        .find(|g| {
            let selector = g.selector.to_lowercase();
            if snapshot.windows.is_empty() {
                return snapshot
                    .processes
                    .values()
                    .any(|name| name.to_lowercase().contains(&selector));
            }
            snapshot.windows.iter().any(|w| {
                w.title.to_lowercase().contains(&selector)
                    || snapshot
                        .process_name(w.pid)
                        .is_some_and(|name| name.to_lowercase().contains(&selector))
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::WindowInfo;

    fn entry(name: &str, selector: &str, enabled: bool) -> GameEntry {
        GameEntry {
            name: name.to_string(),
            selector: selector.to_string(),
            scene_hint: None,
            enabled,
        }
    }

    fn snapshot(windows: &[(&str, u32)], processes: &[(u32, &str)]) -> ActivitySnapshot {
        ActivitySnapshot {
            windows: windows
                .iter()
                .map(|(title, pid)| WindowInfo { title: title.to_string(), pid: *pid })
                .collect(),
            processes: processes
                .iter()
                .map(|(pid, name)| (*pid, name.to_string()))
                .collect(),
        }
    }

    // ── matching ──────────────────────────────────────────────────────────────

    #[test]
    fn matches_window_title_case_insensitively() {
        let games = [entry("Rocket League", "rocket league", true)];
        let snap = snapshot(&[("ROCKET LEAGUE (64-bit)", 10)], &[]);
        assert_eq!(detect(&games, &snap).unwrap().name, "Rocket League");
    }

    #[test]
    fn matches_owning_process_name() {
        let games = [entry("Rocket League", "rocketleague.exe", true)];
        let snap = snapshot(&[("Some Window", 10)], &[(10, "RocketLeague.exe")]);
        assert_eq!(detect(&games, &snap).unwrap().name, "Rocket League");
    }

    #[test]
    fn falls_back_to_process_names_only_without_any_windows() {
        let games = [entry("Factorio", "factorio", true)];
        let snap = snapshot(&[], &[(99, "factorio.bin")]);
        assert_eq!(detect(&games, &snap).unwrap().name, "Factorio");
    }

    #[test]
    fn background_process_does_not_match_while_windows_are_enumerable() {
        let games = [entry("Factorio", "factorio", true)];
        // A lingering windowless updater must not read as the game running.
        let snap = snapshot(
            &[("Text Editor", 5)],
            &[(5, "editor.exe"), (99, "factorio-updater.bin")],
        );
        assert!(detect(&games, &snap).is_none());
    }

    #[test]
    fn selector_is_a_substring_not_exact() {
        let games = [entry("Elden Ring", "elden", true)];
        let snap = snapshot(&[("ELDEN RING™", 5)], &[]);
        assert!(detect(&games, &snap).is_some());
    }

    // ── ordering ──────────────────────────────────────────────────────────────

    #[test]
    fn first_match_in_registry_order_wins() {
        let games = [entry("Second", "beta", true), entry("First", "alpha", true)];
        let snap = snapshot(&[("alpha window", 1), ("beta window", 2)], &[]);
        // Both match; "Second" is earlier in the registry.
        assert_eq!(detect(&games, &snap).unwrap().name, "Second");
    }

    #[test]
    fn disabled_entries_are_skipped_even_when_matching() {
        let games = [entry("Off", "game", false), entry("On", "game", true)];
        let snap = snapshot(&[("game window", 1)], &[]);
        assert_eq!(detect(&games, &snap).unwrap().name, "On");
    }

    // ── no match ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_registry_returns_none() {
        let snap = snapshot(&[("anything", 1)], &[(1, "anything.exe")]);
        assert!(detect(&[], &snap).is_none());
    }

    #[test]
    fn all_disabled_returns_none() {
        let games = [entry("A", "a", false)];
        let snap = snapshot(&[("a window", 1)], &[]);
        assert!(detect(&games, &snap).is_none());
    }

    #[test]
    fn empty_selector_never_matches() {
        let games = [entry("Broken", "", true)];
        let snap = snapshot(&[("any window", 1)], &[(1, "any.exe")]);
        assert!(detect(&games, &snap).is_none());
    }

    #[test]
    fn no_running_match_returns_none() {
        let games = [entry("Foo", "foo", true)];
        let snap = snapshot(&[("bar window", 1)], &[(1, "bar.exe")]);
        assert!(detect(&games, &snap).is_none());
    }
}
