//! Application entry point — headless pedometer service.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run, and writes
//!    it out so there is a file to edit).
//! 3. Build the host adapters and the live [`TomlConfigSource`].
//! 4. Attach a callback that prints one JSON line per notification.
//! 5. Start the session.
//! 6. On a [`tokio`] runtime: tick the pace every second, re-read the
//!    preferences every 5 s, stop on Ctrl-C.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

use pedometer_service::{
    config::{AppConfig, AppPaths, TomlConfigSource},
    host::{LogStatusIndicator, ProcessWakeLock},
    pace::SystemClock,
    session::{Collaborators, Coordinator, SessionCallback},
    speech::LogSpeech,
    steps::SimulatedStepSource,
};

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const RELOAD_INTERVAL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// JsonLinesCallback
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum SessionEvent {
    Steps { count: u32 },
    Pace { steps_per_minute: u32 },
}

/// Prints every notification to stdout as a single JSON object.
struct JsonLinesCallback;

impl JsonLinesCallback {
    fn emit(&self, event: &SessionEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to encode session event: {e}");
                return;
            }
        };
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}") {
            log::warn!("Failed to write session event: {e}");
        }
    }
}

impl SessionCallback for JsonLinesCallback {
    fn steps_changed(&self, count: u32) {
        self.emit(&SessionEvent::Steps { count });
    }

    fn pace_changed(&self, pace: u32) {
        self.emit(&SessionEvent::Pace {
            steps_per_minute: pace,
        });
    }
}

// ---------------------------------------------------------------------------
// Control loop
// ---------------------------------------------------------------------------

async fn run(coordinator: Arc<Coordinator>) -> anyhow::Result<()> {
    let mut tick = tokio::time::interval(TICK_INTERVAL);
    let mut reload = tokio::time::interval(RELOAD_INTERVAL);
    // The first tick of an interval fires immediately; skip it for reload,
    // `start()` has just read the preferences.
    reload.tick().await;

    loop {
        tokio::select! {
            _ = tick.tick() => coordinator.tick(),
            _ = reload.tick() => coordinator.reload_configuration(),
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                log::info!("Ctrl-C received, stopping");
                break;
            }
        }
    }

    coordinator.stop();
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Pedometer service starting up");

    // 2. Configuration
    let first_run = AppConfig::is_first_run();
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if first_run {
        if let Err(e) = config.save() {
            log::warn!("Failed to write default config: {e}");
        }
    }

    // 3. Collaborators
    let paths = AppPaths::new();
    let preferences = TomlConfigSource::open_or_default(&paths.settings_file);

    let coordinator = Arc::new(Coordinator::new(
        Collaborators {
            steps: Arc::new(SimulatedStepSource::new(config.simulation.cadence_spm)),
            speech: Some(Arc::new(LogSpeech::new())),
            config: Arc::new(preferences),
            wake_lock: Arc::new(ProcessWakeLock::new()),
            status: Arc::new(LogStatusIndicator::new()),
            clock: Arc::new(SystemClock),
        },
        config.pace.clone(),
        config.status.clone(),
    ));

    // 4. Observer
    coordinator.register_callback(Some(Arc::new(JsonLinesCallback)));
    coordinator.set_desired_pace(config.preferences.desired_pace);

    // 5. Session
    coordinator
        .start()
        .context("pedometer session could not start")?;

    // 6. Runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let result = rt.block_on(run(Arc::clone(&coordinator)));
    if result.is_err() {
        coordinator.stop();
    }
    result
}
