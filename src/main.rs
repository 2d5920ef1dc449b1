use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use clicksounds::app::App;
use clicksounds::audio::{AudioEngine, RodioBackend};
use clicksounds::config::Config;
use clicksounds::error::AppResult;
use clicksounds::input;
use clicksounds::watcher::ConfigWatcher;

/// Cadence of the periodic update tick driving fades and reclamation.
const UPDATE_INTERVAL: Duration = Duration::from_millis(10);

struct Args {
    config_path: PathBuf,
}

fn parse_args() -> Option<Args> {
    let mut config_path = PathBuf::from("config.json");
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("ClickSounds - Keyboard and mouse sound effects");
                println!("Usage: clicksounds [options]");
                println!("Options:");
                println!("  -c, --config <path>  Config file (default: config.json)");
                println!("  -h, --help           Show this help message");
                return None;
            }
            "-c" | "--config" => {
                if let Some(path) = args.next() {
                    config_path = PathBuf::from(path);
                } else {
                    eprintln!("--config requires a path");
                    return None;
                }
            }
            other => {
                eprintln!("Unknown option: {other} (try --help)");
                return None;
            }
        }
    }

    Some(Args { config_path })
}

fn main() -> AppResult<()> {
    let Some(args) = parse_args() else {
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load(&args.config_path)
        .with_context(|| format!("loading config from {}", args.config_path.display()))?;

    // Device-open failure is the one hard error: without a device there is
    // nothing useful to run.
    let (_stream, backend) =
        RodioBackend::init().context("initializing audio output device")?;
    let engine = Arc::new(AudioEngine::new(Box::new(backend)));
    let app = Arc::new(App::new(Arc::clone(&engine), config));

    let _watcher = {
        let app = Arc::clone(&app);
        match ConfigWatcher::watch(&app.config_path(), move || app.reload_config()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!("Config file watcher unavailable, hot reload disabled: {e}");
                None
            }
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let _tick = {
        let engine = Arc::clone(&engine);
        input::spawn_update_tick(UPDATE_INTERVAL, Arc::clone(&running), move || {
            engine.update()
        })
    };

    let _hooks = {
        let app = Arc::clone(&app);
        input::spawn_listener(move |event| app.handle_event(event))
    };

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("installing Ctrl+C handler")?;

    tracing::info!("ClickSounds started, press Ctrl+C to exit");
    let _ = shutdown_rx.recv();

    tracing::info!("Shutting down");
    running.store(false, Ordering::Relaxed);
    engine.shutdown();
    // The input hook thread cannot be unhooked; it ends with the process.
    Ok(())
}
