//! Presentation bridge: carries round events out of the worker thread and
//! converts them into JSON-ready DTOs.
//!
//! The round controller runs on a plain OS thread; presentation code (the
//! terminal runner in `main.rs`, or any UI frontend) runs in an async Tokio
//! context.  [`ChannelEventSink`] is the seam between the two: it implements
//! [`RoundEventSink`] by pushing events into a Tokio mpsc channel with
//! `blocking_send`, which is the correct call from outside the runtime.
//!
//! # Data Transfer Objects (DTOs)
//!
//! [`RoundEvent`] carries an `Arc<Frame>` and domain enums.  Frontends need
//! something flat and serialisable instead, so [`RoundEventDto`]:
//!
//! - Contains only JSON-friendly fields (`String`, `u32`).
//! - Summarises preview frames by size; pixel data never goes over the wire.
//! - Includes the display text (`"Get ready: 3"`, `"You win!"`, the reveal
//!   line) so a frontend does not need to duplicate game wording.
//!
//! Serialised with an `"event"` tag, e.g.
//! `{"event":"countdown_tick","round_id":"…","remaining":3,"label":"Get ready: 3"}`.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::play_round::{RoundEvent, RoundEventSink};

/// Prompt shown when capturing starts.
pub const CAPTURE_PROMPT: &str = "Show your gesture!";

// ── Channel sink ──────────────────────────────────────────────────────────────

/// Forwards round events into a Tokio mpsc channel.
///
/// Must be used from a non-async thread (the round worker): `blocking_send`
/// panics when called from inside a Tokio runtime.
pub struct ChannelEventSink {
    tx: mpsc::Sender<RoundEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<RoundEvent>) -> Self {
        Self { tx }
    }
}

impl RoundEventSink for ChannelEventSink {
    fn emit(&self, event: RoundEvent) {
        if self.tx.blocking_send(event).is_err() {
            debug!("round event receiver dropped; event discarded");
        }
    }
}

/// Creates a bounded event channel and its sink.
pub fn event_channel(capacity: usize) -> (ChannelEventSink, mpsc::Receiver<RoundEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelEventSink::new(tx), rx)
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// Serialisable view of one [`RoundEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEventDto {
    CountdownTick {
        round_id: String,
        remaining: u32,
        label: String,
    },
    FrameReady {
        round_id: String,
        width: u32,
        height: u32,
    },
    CaptureStarted {
        round_id: String,
        prompt: String,
    },
    RoundComplete {
        round_id: String,
        player: String,
        computer: String,
        /// `"win"`, `"lose"` or `"tie"`; frontends key result art off this.
        outcome: String,
        message: String,
        reveal: String,
    },
    RoundAborted {
        round_id: String,
        reason: String,
    },
    RoundCancelled {
        round_id: String,
    },
}

impl From<&RoundEvent> for RoundEventDto {
    fn from(event: &RoundEvent) -> Self {
        let round_id = event.round_id().to_string();
        match event {
            RoundEvent::CountdownTick { remaining, .. } => RoundEventDto::CountdownTick {
                round_id,
                remaining: *remaining,
                label: format!("Get ready: {remaining}"),
            },
            RoundEvent::FrameReady { frame, .. } => RoundEventDto::FrameReady {
                round_id,
                width: frame.width(),
                height: frame.height(),
            },
            RoundEvent::CaptureStarted { .. } => RoundEventDto::CaptureStarted {
                round_id,
                prompt: CAPTURE_PROMPT.to_string(),
            },
            RoundEvent::RoundComplete { result, .. } => RoundEventDto::RoundComplete {
                round_id,
                player: result.player.to_string(),
                computer: result.computer.to_string(),
                outcome: result.outcome.tag().to_string(),
                message: result.outcome.message().to_string(),
                reveal: result.reveal_line(),
            },
            RoundEvent::RoundAborted { reason, .. } => RoundEventDto::RoundAborted {
                round_id,
                reason: reason.clone(),
            },
            RoundEvent::RoundCancelled { .. } => RoundEventDto::RoundCancelled { round_id },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
