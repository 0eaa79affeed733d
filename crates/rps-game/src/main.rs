//! Gesture rock-paper-scissors: terminal runner.
//!
//! Plays one or more rounds against the computer and prints the countdown,
//! the reveal line and the result.  With `--json` every round event is
//! printed as one JSON object per line instead, so a UI frontend can drive
//! its own presentation from this process's stdout.
//!
//! # Usage
//!
//! ```text
//! rps-game [OPTIONS]
//!
//! Options:
//!   --camera <INDEX>     Camera device index (skips probing)
//!   --rounds <N>         Rounds to play, 0 = until Ctrl-C [default: 1]
//!   --countdown <TICKS>  Countdown ticks before capture
//!   --tick-ms <MS>       Length of one countdown tick
//!   --json               Print events as JSON lines
//!   --demo               Use a simulated camera instead of a webcam
//!   --config <PATH>      Read this config file instead of the platform one
//! ```
//!
//! Every flag can also be set through the matching `RPS_*` environment
//! variable (`RPS_CAMERA`, `RPS_ROUNDS`, ...).  Flags override the config file.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- TOML, defaults when absent
//!  └─ select_camera()          -- unless --camera / preferred_index is set
//!  └─ per round:
//!       ├─ spawn_round_with_stop()   (rps-round-worker thread)
//!       └─ event loop: print events until the worker hands the controller back
//! ```
//!
//! # Hand detection
//!
//! No hand-pose model ships with this binary.  Hands are supplied by
//! `RandomPoseProvider`, which shows a random (sometimes unplayable) pose
//! every few frames.  A real detector plugs in through the
//! `LandmarkProvider` trait.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rps_core::{Outcome, RoundResult};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rps_game::application::play_round::{
    RandomMovePicker, RoundController, RoundError, RoundEvent,
};
use rps_game::application::select_camera::select_camera;
use rps_game::infrastructure::camera::{mock::ScriptedCameraBackend, CameraBackend};
use rps_game::infrastructure::landmarks::demo::RandomPoseProvider;
use rps_game::infrastructure::storage::config::{
    load_config, load_config_from, AppConfig, ConfigError,
};
use rps_game::infrastructure::ui_bridge::{event_channel, RoundEventDto, CAPTURE_PROMPT};
use rps_game::infrastructure::worker::spawn_round_with_stop;

/// Frames without a hand before the demo provider shows one.
const DEMO_EMPTY_FRAMES: u32 = 5;

/// Shown on stdout when the webcam is live but hands are not read from it.
const SIMULATED_HANDS_NOTICE: &str =
    "Note: hand detection is simulated. Your gesture is not read from the camera.";

/// Capacity of the worker → presenter event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Gesture rock-paper-scissors against the computer.
#[derive(Debug, Parser)]
#[command(
    name = "rps-game",
    about = "Play rock-paper-scissors against the computer with hand gestures",
    version
)]
struct Cli {
    /// Camera device index.  Skips probing when set.
    #[arg(long, env = "RPS_CAMERA")]
    camera: Option<u32>,

    /// Number of rounds to play.  `0` plays until Ctrl-C.
    #[arg(long, default_value_t = 1, env = "RPS_ROUNDS")]
    rounds: u32,

    /// Countdown ticks before capturing starts (overrides the config file).
    #[arg(long, env = "RPS_COUNTDOWN")]
    countdown: Option<u32>,

    /// Length of one countdown tick in milliseconds (overrides the config file).
    #[arg(long, env = "RPS_TICK_MS")]
    tick_ms: Option<u64>,

    /// Print round events as JSON lines instead of text.
    #[arg(long, env = "RPS_JSON")]
    json: bool,

    /// Use a simulated camera instead of a real webcam.
    #[arg(long, env = "RPS_DEMO")]
    demo: bool,

    /// Config file to read instead of the platform default.
    #[arg(long, env = "RPS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(ConfigError::NoPlatformConfigDir) => AppConfig::default(),
        Err(e) => return Err(e).context("failed to load configuration"),
    };

    // Structured logging to stderr so stdout stays clean for --json.
    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("gesture rock-paper-scissors starting");

    // ── Camera ────────────────────────────────────────────────────────────────
    let backend = camera_backend(cli.demo)?;
    let camera_index = match cli.camera.or(config.camera.preferred_index) {
        Some(index) => {
            info!(index, "using configured camera");
            index
        }
        None => {
            let probe_backend = Arc::clone(&backend);
            let candidates = config.camera.candidates();
            tokio::task::spawn_blocking(move || select_camera(probe_backend.as_ref(), &candidates))
                .await
                .context("camera probe task failed")?
                .context("no usable camera")?
        }
    };

    // ── Round controller ──────────────────────────────────────────────────────
    let mut settings = config.game.round_settings();
    if let Some(ticks) = cli.countdown {
        settings.countdown_ticks = ticks;
    }
    if let Some(ms) = cli.tick_ms {
        settings.tick_interval = Duration::from_millis(ms);
    }

    let (sink, mut events) = event_channel(EVENT_CHANNEL_CAPACITY);
    let mut controller = RoundController::new(
        backend,
        camera_index,
        Box::new(RandomPoseProvider::new(DEMO_EMPTY_FRAMES)),
        Box::new(RandomMovePicker::new()),
        Box::new(sink),
        settings,
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let quit = Arc::new(AtomicBool::new(false));
    let quit_clone = Arc::clone(&quit);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            quit_clone.store(true, Ordering::SeqCst);
        }
    });

    // ── Round loop ────────────────────────────────────────────────────────────
    let presenter = Presenter::new(cli.json, config.game.reveal_hold());
    if !cli.demo {
        warn!("no hand landmark model is bundled; hands are simulated");
    }
    if let Some(notice) = simulated_hands_notice(cli.json, cli.demo) {
        println!("{notice}");
    }
    let mut tally = Tally::default();
    let mut played = 0;
    let mut failure = None;

    while cli.rounds == 0 || played < cli.rounds {
        if quit.load(Ordering::SeqCst) {
            break;
        }
        played += 1;
        presenter.round_header(played, cli.rounds);

        let handle = spawn_round_with_stop(controller, Arc::clone(&quit))
            .context("failed to spawn round worker")?;
        let mut join = tokio::task::spawn_blocking(move || handle.join());

        let finished = loop {
            tokio::select! {
                Some(event) = events.recv() => presenter.show(&event).await?,
                joined = &mut join => {
                    break joined
                        .context("round worker task failed")?
                        .context("round worker failed")?;
                }
            }
        };
        while let Ok(event) = events.try_recv() {
            presenter.show(&event).await?;
        }

        controller = finished.controller;
        match finished.result {
            Ok(result) => tally.record(&result),
            Err(RoundError::Cancelled) => break,
            Err(e) => {
                error!("round failed: {e}");
                failure = Some(e);
                break;
            }
        }
    }

    controller.release();
    presenter.summary(&tally);
    info!("gesture rock-paper-scissors stopped");

    match failure {
        Some(e) => Err(e).context("game stopped"),
        None => Ok(()),
    }
}

/// Chooses the camera implementation for this run.
fn camera_backend(demo: bool) -> anyhow::Result<Arc<dyn CameraBackend>> {
    if demo {
        info!("demo mode: using a simulated camera");
        return Ok(Arc::new(ScriptedCameraBackend::new([0])));
    }

    #[cfg(feature = "nokhwa")]
    {
        Ok(Arc::new(
            rps_game::infrastructure::camera::webcam::NokhwaBackend::new(),
        ))
    }

    #[cfg(not(feature = "nokhwa"))]
    {
        Err(rps_game::infrastructure::camera::CameraError::Unsupported(
            "built without the `nokhwa` feature".to_string(),
        ))
        .context("no webcam support; rebuild with `--features nokhwa` or pass --demo")
    }
}

/// Text-mode notice for a live webcam paired with simulated hands.
fn simulated_hands_notice(json: bool, demo: bool) -> Option<&'static str> {
    if json || demo {
        None
    } else {
        Some(SIMULATED_HANDS_NOTICE)
    }
}

// ── Presentation ──────────────────────────────────────────────────────────────

/// Prints round events as text or JSON lines.
struct Presenter {
    json: bool,
    reveal_hold: Duration,
}

impl Presenter {
    fn new(json: bool, reveal_hold: Duration) -> Self {
        Self { json, reveal_hold }
    }

    fn round_header(&self, round: u32, total: u32) {
        if self.json {
            return;
        }
        if total == 0 {
            println!("\n── Round {round} ──");
        } else {
            println!("\n── Round {round} of {total} ──");
        }
    }

    async fn show(&self, event: &RoundEvent) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(&RoundEventDto::from(event))?);
            return Ok(());
        }

        match event {
            RoundEvent::CountdownTick { remaining, .. } => println!("Get ready: {remaining}"),
            RoundEvent::FrameReady { .. } => {}
            RoundEvent::CaptureStarted { .. } => println!("{CAPTURE_PROMPT}"),
            RoundEvent::RoundComplete { result, .. } => {
                println!("{}", result.reveal_line());
                tokio::time::sleep(self.reveal_hold).await;
                println!("{}", result.outcome.message());
            }
            RoundEvent::RoundAborted { reason, .. } => println!("Round aborted: {reason}"),
            RoundEvent::RoundCancelled { .. } => println!("Round cancelled."),
        }
        Ok(())
    }

    fn summary(&self, tally: &Tally) {
        if self.json {
            let summary = serde_json::json!({
                "event": "summary",
                "wins": tally.wins,
                "losses": tally.losses,
                "ties": tally.ties,
            });
            println!("{summary}");
        } else if tally.played() > 0 {
            println!(
                "\nFinal score: You {} | Computer {} | Ties {}",
                tally.wins, tally.losses, tally.ties
            );
        }
    }
}

/// Running score across rounds.
#[derive(Debug, Default)]
struct Tally {
    wins: u32,
    losses: u32,
    ties: u32,
}

impl Tally {
    fn record(&mut self, result: &RoundResult) {
        match result.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Lose => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
    }

    fn played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
