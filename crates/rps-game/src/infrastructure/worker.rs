//! Background round worker.
//!
//! A round blocks for seconds (countdown sleeps, camera reads), so it runs on
//! a dedicated OS thread named `rps-round-worker` while the caller stays
//! responsive.
//!
//! # Ownership hand-off
//!
//! The [`RoundController`] is *moved* into the worker thread and handed back
//! when the thread finishes ([`RoundHandle::join`]).  Nothing about the round
//! is shared except the stop flag, an `Arc<AtomicBool>`.
//!
//! # Shutdown
//!
//! [`RoundHandle::cancel`] raises the stop flag and joins the thread.  The
//! controller checks the flag before every frame read and while sleeping
//! through countdown ticks, releases the camera and returns
//! `RoundError::Cancelled`.  The camera counts as free only once `join`
//! returns.

use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;

use rps_core::RoundResult;
use thiserror::Error;
use tracing::{debug, error};

use crate::application::play_round::{RoundController, RoundError};

/// Name given to the round worker thread.
pub const WORKER_THREAD_NAME: &str = "rps-round-worker";

#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker thread panicked; the controller (and its camera) is lost.
    #[error("round worker panicked: {0}")]
    Panicked(String),
}

/// What a finished worker hands back.
pub struct RoundFinished {
    /// The controller, ready for the next round.
    pub controller: RoundController,
    pub result: Result<RoundResult, RoundError>,
}

/// Handle to a round running on the worker thread.
pub struct RoundHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<RoundFinished>,
}

impl RoundHandle {
    /// The shared stop flag, e.g. for a Ctrl-C handler.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Asks the round to stop without waiting for it.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Waits for the round to end and takes the controller back.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] if the worker thread panicked.
    pub fn join(self) -> Result<RoundFinished, WorkerError> {
        self.thread.join().map_err(|payload| {
            let message = panic_message(payload.as_ref());
            error!("{WORKER_THREAD_NAME} panicked: {message}");
            WorkerError::Panicked(message)
        })
    }

    /// Raises the stop flag and waits for the worker to exit.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] if the worker thread panicked.
    pub fn cancel(self) -> Result<RoundFinished, WorkerError> {
        self.request_stop();
        self.join()
    }
}

/// Moves `controller` onto a new worker thread and starts one round.
///
/// # Errors
///
/// Returns the `io::Error` from the OS if the thread cannot be spawned.
pub fn spawn_round(controller: RoundController) -> io::Result<RoundHandle> {
    spawn_round_with_stop(controller, Arc::new(AtomicBool::new(false)))
}

/// Like [`spawn_round`], but observes an existing stop flag, so one flag
/// (e.g. raised by Ctrl-C) can end a whole session of rounds.
///
/// # Errors
///
/// Returns the `io::Error` from the OS if the thread cannot be spawned.
pub fn spawn_round_with_stop(
    mut controller: RoundController,
    stop: Arc<AtomicBool>,
) -> io::Result<RoundHandle> {
    let worker_stop = Arc::clone(&stop);

    let thread = std::thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let result = controller.start_round(&worker_stop);
            debug!(ok = result.is_ok(), "round worker finished");
            RoundFinished { controller, result }
        })?;

    Ok(RoundHandle { stop, thread })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
