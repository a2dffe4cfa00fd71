mod backend;
mod clip;
mod detect;
mod doc;
mod event;
mod guard;
mod hotkey;
mod markers;
mod organizer;
mod paths;
mod recordings;
mod registry;
mod scanner;
mod settings;
mod state;
mod watcher;

use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::doc::TrackedDoc;
use crate::scanner::SystemScanner;
use crate::settings::Settings;
use crate::watcher::Watcher;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        std::process::exit(run_command(&args));
    }

    // ── App data directory ────────────────────────────────────────────────────
    let app_dir = paths::app_data_dir();
    if let Err(e) = std::fs::create_dir_all(&app_dir) {
        eprintln!("Failed to create app data directory {}: {e}", app_dir.display());
        std::process::exit(1);
    }

    // ── Single-instance guard ─────────────────────────────────────────────────
    let pid_path = paths::pid_file_path();
    if let Err(e) = guard::acquire(&pid_path) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    // ── Configuration documents ───────────────────────────────────────────────
    let registry = TrackedDoc::load(paths::games_file_path());
    let settings: TrackedDoc<Settings> = TrackedDoc::load(paths::settings_file_path());

    // ── Backend output folder ─────────────────────────────────────────────────
    let watch_folder = backend::discover_output_folder();
    println!("[watch] Backend output folder: {}", watch_folder.display());

    let (event_tx, mut event_rx) = mpsc::channel::<event::WatcherEvent>(32);

    // ── Marker hotkey ─────────────────────────────────────────────────────────
    let initial_key = settings.value().hotkey.effective_key().to_string();
    let hotkey_handle = hotkey::start(&initial_key, event_tx.clone());

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(event::WatcherEvent::Shutdown).await;
            }
        });
    }

    println!("reelkeeper-watcher v{} started", env!("CARGO_PKG_VERSION"));

    let mut watcher = Watcher::new(
        SystemScanner::new(),
        registry,
        settings,
        paths::state_file_path(),
        paths::markers_file_path(),
        watch_folder,
    )
    .with_hotkey(hotkey_handle);

    watcher.run(&mut event_rx).await;

    watcher.stop_hotkey();
    guard::release(&pid_path);
}

// ── Maintenance commands ──────────────────────────────────────────────────────
// One-shot modes that run without starting the watch loop (or touching the
// instance guard). These back the manual operations the GUI exposes.

fn run_command(args: &[String]) -> i32 {
    match args[0].as_str() {
        "--status" => {
            match state::read(&paths::state_file_path()) {
                Some(state) => println!("{}", state.to_line()),
                None => println!("no state published"),
            }
            0
        }
        "--list" => {
            let settings = load_settings();
            let root = PathBuf::from(organizer::expand_env(&settings.organizer.organized_root));
            let mut recs = recordings::scan_recordings(&root);
            recs.sort_by(|a, b| {
                (&a.game_name, a.session_date, &a.filename)
                    .cmp(&(&b.game_name, b.session_date, &b.filename))
            });
            for rec in &recs {
                println!(
                    "{:>8.1} MiB  {}  {}",
                    rec.size_bytes as f64 / (1024.0 * 1024.0),
                    rec.session_date,
                    rec.filename
                );
            }
            0
        }
        "--extract" if args.len() == 5 => {
            let source = PathBuf::from(&args[1]);
            let (Ok(start), Ok(end)) = (args[2].parse::<f64>(), args[3].parse::<f64>()) else {
                eprintln!("start/end must be seconds, e.g. --extract session.mp4 90 120 Foo");
                return 2;
            };
            let game = &args[4];
            let settings = load_settings();
            let root = PathBuf::from(organizer::expand_env(&settings.organizer.organized_root));
            let dest_dir = root.join(format!("{} - Clips", organizer::sanitize_component(game)));
            match clip::extract(&source, start, end, game, &dest_dir, &settings.tools) {
                Ok(info) => {
                    println!(
                        "Extracted {:.1}s starting at {:.1}s -> {}",
                        info.duration,
                        info.start,
                        info.path.display()
                    );
                    0
                }
                Err(e) => {
                    eprintln!("Extraction failed: {e:#}");
                    1
                }
            }
        }
        "--reencode" if args.len() >= 2 => {
            let source = PathBuf::from(&args[1]);
            let replace = args.get(2).is_some_and(|a| a == "--replace");
            let settings = load_settings();
            match clip::reencode(&source, &clip::ReencodeOptions::default(), replace, &settings.tools) {
                Ok(path) => {
                    println!("Re-encoded to {}", path.display());
                    0
                }
                Err(e) => {
                    eprintln!("Re-encode failed: {e:#}");
                    1
                }
            }
        }
        "--help" | "-h" => {
            print_usage();
            0
        }
        other => {
            eprintln!("Unknown argument: {other}");
            print_usage();
            2
        }
    }
}

fn load_settings() -> Settings {
    match doc::read_or_default(&paths::settings_file_path()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("[settings] {e:#}; using defaults");
            Settings::default()
        }
    }
}

fn print_usage() {
    println!("usage: reelkeeper-watcher [command]");
    println!();
    println!("With no command, runs the watch loop until Ctrl+C.");
    println!();
    println!("  --status                               print the published watcher state");
    println!("  --list                                 list archived session recordings");
    println!("  --extract <file> <start> <end> <game>  cut a clip (seconds) into the game's clip folder");
    println!("  --reencode <file> [--replace]          shrink a recording with the default encoder");
}
