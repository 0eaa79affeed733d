//! PlayRound: drives one round from countdown to a decided outcome.
//!
//! The [`RoundController`] is an explicit state machine:
//!
//! ```text
//!            start_round
//!   Idle ───────────────► Countdown ──► Capturing ──► Resolved
//!    ▲                        │             │
//!    │ stop flag              └──────┬──────┘ read failure / bad landmarks
//!    └───────────────────────────────┤
//!                                    ▼
//!                                 Aborted
//! ```
//!
//! # Timing
//!
//! The countdown holds `countdown_ticks` ticks, each `tick_interval` long.
//! Every tick reads one frame so the preview stays live.  Capturing has no
//! timeout: it polls frames until the first recognized gesture or until the
//! stop flag is raised.
//!
//! # Resources
//!
//! The opened camera lives in an `Option` on the controller.  Every exit path
//! of [`RoundController::start_round`] goes through [`RoundController::release`],
//! which takes the device out of the `Option` before releasing it, so a device
//! is released exactly once per acquisition.
//!
//! # Architecture
//!
//! The controller depends only on traits (`CameraBackend`, `LandmarkProvider`,
//! `MovePicker`, `RoundEventSink`) and domain types.  All implementations are
//! injected at construction time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::{rngs::SmallRng, Rng, SeedableRng};
use rps_core::{classify, ClassifyError, Gesture, RoundResult};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::infrastructure::camera::{CameraBackend, CameraDevice, CameraError, Frame};
use crate::infrastructure::landmarks::LandmarkProvider;

/// Longest single sleep while waiting out a countdown tick.  The stop flag is
/// checked between slices.
const SLEEP_SLICE: Duration = Duration::from_millis(25);

/// Correlates log lines and events belonging to one round.
pub type RoundId = Uuid;

/// Error type for the play-round use case.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    /// The camera could not be opened or stopped delivering frames.
    #[error("Unable to access the camera: {0}")]
    Acquisition(#[from] CameraError),
    /// The landmark provider returned a hand with the wrong number of points.
    #[error("hand detector returned malformed landmarks: {0}")]
    InvalidLandmarks(#[from] ClassifyError),
    /// The stop flag was raised before the round was decided.
    #[error("round cancelled")]
    Cancelled,
}

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    Countdown,
    Capturing,
    Resolved,
    Aborted,
}

/// Everything the controller tells the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    /// A countdown tick began; `remaining` counts down to 1.
    CountdownTick { round_id: RoundId, remaining: u32 },
    /// A new preview frame (mirrored when `mirror_preview` is set).
    FrameReady { round_id: RoundId, frame: Arc<Frame> },
    /// The computer has committed to its move; show your gesture.
    CaptureStarted { round_id: RoundId },
    /// The round was decided.
    RoundComplete { round_id: RoundId, result: RoundResult },
    /// The round ended without an outcome.
    RoundAborted { round_id: RoundId, reason: String },
    /// The round was stopped from outside.
    RoundCancelled { round_id: RoundId },
}

impl RoundEvent {
    /// The round this event belongs to.
    pub fn round_id(&self) -> RoundId {
        match self {
            RoundEvent::CountdownTick { round_id, .. }
            | RoundEvent::FrameReady { round_id, .. }
            | RoundEvent::CaptureStarted { round_id }
            | RoundEvent::RoundComplete { round_id, .. }
            | RoundEvent::RoundAborted { round_id, .. }
            | RoundEvent::RoundCancelled { round_id } => *round_id,
        }
    }

    /// True for the last event of a round.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RoundEvent::RoundComplete { .. }
                | RoundEvent::RoundAborted { .. }
                | RoundEvent::RoundCancelled { .. }
        )
    }
}

/// Receives round events.  Called from whichever thread runs the round.
pub trait RoundEventSink: Send {
    fn emit(&self, event: RoundEvent);
}

/// Chooses the computer's move.
pub trait MovePicker: Send {
    fn pick(&mut self) -> Gesture;
}

/// Uniform random choice over rock, paper and scissors.
pub struct RandomMovePicker {
    rng: SmallRng,
}

impl RandomMovePicker {
    /// Seeds from the operating system.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Deterministic picker for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomMovePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl MovePicker for RandomMovePicker {
    fn pick(&mut self) -> Gesture {
        Gesture::ALL[self.rng.random_range(0..Gesture::ALL.len())]
    }
}

/// Timing and presentation knobs for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSettings {
    /// Number of countdown ticks before capturing starts.
    pub countdown_ticks: u32,
    /// Length of one countdown tick.
    pub tick_interval: Duration,
    /// Mirror preview frames (selfie view).  Detection always sees the raw frame.
    pub mirror_preview: bool,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            countdown_ticks: 3,
            tick_interval: Duration::from_secs(1),
            mirror_preview: true,
        }
    }
}

/// Per-round mutable state, discarded when the round ends.
#[derive(Debug)]
struct RoundState {
    id: RoundId,
    remaining: u32,
    computer: Option<Gesture>,
    player: Option<Gesture>,
}

impl RoundState {
    fn new(countdown_ticks: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            remaining: countdown_ticks,
            computer: None,
            player: None,
        }
    }
}

/// Owns the camera and runs rounds one at a time.
pub struct RoundController {
    backend: Arc<dyn CameraBackend>,
    camera_index: u32,
    device: Option<Box<dyn CameraDevice>>,
    landmarks: Box<dyn LandmarkProvider>,
    picker: Box<dyn MovePicker>,
    events: Box<dyn RoundEventSink>,
    settings: RoundSettings,
    phase: RoundPhase,
}

impl RoundController {
    /// Creates an idle controller.  The camera is not opened until a round
    /// starts (or [`acquire`](Self::acquire) is called).
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        camera_index: u32,
        landmarks: Box<dyn LandmarkProvider>,
        picker: Box<dyn MovePicker>,
        events: Box<dyn RoundEventSink>,
        settings: RoundSettings,
    ) -> Self {
        Self {
            backend,
            camera_index,
            device: None,
            landmarks,
            picker,
            events,
            settings,
            phase: RoundPhase::Idle,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// True while a camera device is held open.
    pub fn is_camera_acquired(&self) -> bool {
        self.device.is_some()
    }

    /// Opens the camera unless it is already open.
    pub fn acquire(&mut self) -> Result<(), CameraError> {
        if self.device.is_some() {
            return Ok(());
        }
        let device = self.backend.open(self.camera_index)?;
        self.device = Some(device);
        info!(index = self.camera_index, "camera acquired");
        Ok(())
    }

    /// Releases the camera if it is open.  A second call is a no-op.
    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            info!(index = self.camera_index, "camera released");
        }
    }

    /// Releases and reopens the camera.
    pub fn reset(&mut self) -> Result<(), CameraError> {
        self.release();
        self.acquire()
    }

    /// Plays one round to completion on the calling thread.
    ///
    /// Blocks for the countdown and for as long as capturing takes.  Raise
    /// `stop` from another thread to cancel; the flag is checked before every
    /// frame read and between countdown sleep slices.
    ///
    /// # Errors
    ///
    /// - [`RoundError::Acquisition`] if the camera cannot be opened or a read
    ///   fails (phase becomes `Aborted`).
    /// - [`RoundError::InvalidLandmarks`] if the provider hands back a
    ///   malformed hand (phase becomes `Aborted`).
    /// - [`RoundError::Cancelled`] if `stop` was raised (phase becomes `Idle`).
    pub fn start_round(&mut self, stop: &AtomicBool) -> Result<RoundResult, RoundError> {
        self.phase = RoundPhase::Idle;
        let mut state = RoundState::new(self.settings.countdown_ticks);
        info!(round_id = %state.id, index = self.camera_index, "round starting");

        let outcome = self.play(&mut state, stop);
        self.release();
        self.conclude(&state, outcome)
    }

    fn play(&mut self, state: &mut RoundState, stop: &AtomicBool) -> Result<RoundResult, RoundError> {
        self.reset()?;
        self.run_countdown(state, stop)?;
        self.run_capture(state, stop)
    }

    fn run_countdown(&mut self, state: &mut RoundState, stop: &AtomicBool) -> Result<(), RoundError> {
        self.enter(state, RoundPhase::Countdown);
        while state.remaining > 0 {
            check_stop(stop)?;
            self.events.emit(RoundEvent::CountdownTick {
                round_id: state.id,
                remaining: state.remaining,
            });
            let frame = self.read_frame()?;
            self.publish_preview(state.id, frame);
            sleep_unless_stopped(self.settings.tick_interval, stop);
            state.remaining -= 1;
        }
        Ok(())
    }

    fn run_capture(
        &mut self,
        state: &mut RoundState,
        stop: &AtomicBool,
    ) -> Result<RoundResult, RoundError> {
        check_stop(stop)?;
        self.enter(state, RoundPhase::Capturing);
        let computer = self.picker.pick();
        state.computer = Some(computer);
        debug!(round_id = %state.id, %computer, "computer move locked");
        self.events.emit(RoundEvent::CaptureStarted { round_id: state.id });

        loop {
            check_stop(stop)?;
            let frame = self.read_frame()?;
            let hands = self.landmarks.detect(&frame);
            let recognized = match hands.first() {
                Some(hand) => classify(hand)?,
                None => None,
            };
            debug!(
                round_id = %state.id,
                hands = hands.len(),
                gesture = ?recognized,
                "capture frame processed"
            );
            self.publish_preview(state.id, frame);

            if let Some(player) = recognized {
                state.player = Some(player);
                return Ok(RoundResult::new(player, computer));
            }
        }
    }

    /// Sets the terminal phase and emits the last event of the round.
    fn conclude(
        &mut self,
        state: &RoundState,
        outcome: Result<RoundResult, RoundError>,
    ) -> Result<RoundResult, RoundError> {
        match &outcome {
            Ok(result) => {
                debug_assert_eq!(state.computer, Some(result.computer));
                debug_assert_eq!(state.player, Some(result.player));
                self.phase = RoundPhase::Resolved;
                info!(
                    round_id = %state.id,
                    player = %result.player,
                    computer = %result.computer,
                    outcome = result.outcome.tag(),
                    "round resolved"
                );
                self.events.emit(RoundEvent::RoundComplete {
                    round_id: state.id,
                    result: *result,
                });
            }
            Err(RoundError::Cancelled) => {
                self.phase = RoundPhase::Idle;
                info!(round_id = %state.id, "round cancelled");
                self.events.emit(RoundEvent::RoundCancelled { round_id: state.id });
            }
            Err(e) => {
                self.phase = RoundPhase::Aborted;
                match e {
                    RoundError::InvalidLandmarks(_) => error!(round_id = %state.id, "round aborted: {e}"),
                    _ => warn!(round_id = %state.id, "round aborted: {e}"),
                }
                self.events.emit(RoundEvent::RoundAborted {
                    round_id: state.id,
                    reason: e.to_string(),
                });
            }
        }
        outcome
    }

    fn enter(&mut self, state: &RoundState, phase: RoundPhase) {
        info!(round_id = %state.id, from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        match self.device.as_mut() {
            Some(device) => device.read_frame(),
            None => Err(CameraError::ReadFailed("camera is not acquired".to_string())),
        }
    }

    fn publish_preview(&self, round_id: RoundId, frame: Frame) {
        let preview = if self.settings.mirror_preview {
            frame.mirror_horizontal()
        } else {
            frame
        };
        self.events.emit(RoundEvent::FrameReady {
            round_id,
            frame: Arc::new(preview),
        });
    }
}

impl Drop for RoundController {
    fn drop(&mut self) {
        self.release();
    }
}

fn check_stop(stop: &AtomicBool) -> Result<(), RoundError> {
    if stop.load(Ordering::SeqCst) {
        Err(RoundError::Cancelled)
    } else {
        Ok(())
    }
}

/// Sleeps for `duration`, returning early once `stop` is raised.
fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::camera::mock::{CameraStats, FrameStep, ScriptedCameraBackend};
    use crate::infrastructure::landmarks::mock::ScriptedLandmarkProvider;
    use crate::infrastructure::landmarks::DetectedHand;
    use rps_core::{FingerState, LandmarkPoint, Outcome};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<RoundEvent>>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<RoundEvent> {
            self.events.lock().unwrap().clone()
        }

        fn last(&self) -> Option<RoundEvent> {
            self.events.lock().unwrap().last().cloned()
        }
    }

    impl RoundEventSink for RecordingSink {
        fn emit(&self, event: RoundEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    /// Always plays the same move and records how many detections had run
    /// when it was asked.
    struct FixedPicker {
        gesture: Gesture,
        picks: Arc<AtomicUsize>,
        detections: Arc<AtomicUsize>,
        detections_at_pick: Arc<Mutex<Vec<usize>>>,
    }

    impl MovePicker for FixedPicker {
        fn pick(&mut self) -> Gesture {
            self.picks.fetch_add(1, Ordering::SeqCst);
            self.detections_at_pick
                .lock()
                .unwrap()
                .push(self.detections.load(Ordering::SeqCst));
            self.gesture
        }
    }

    /// Raises the stop flag after a fixed number of empty detections.
    struct StopAfter {
        stop: Arc<AtomicBool>,
        remaining: usize,
    }

    impl LandmarkProvider for StopAfter {
        fn detect(&mut self, _frame: &Frame) -> Vec<DetectedHand> {
            if self.remaining == 0 {
                self.stop.store(true, Ordering::SeqCst);
            } else {
                self.remaining -= 1;
            }
            Vec::new()
        }
    }

    /// Records events and raises the stop flag when a given tick is announced.
    struct StopOnTick {
        inner: RecordingSink,
        stop: Arc<AtomicBool>,
        tick: u32,
    }

    impl RoundEventSink for StopOnTick {
        fn emit(&self, event: RoundEvent) {
            if matches!(event, RoundEvent::CountdownTick { remaining, .. } if remaining == self.tick) {
                self.stop.store(true, Ordering::SeqCst);
            }
            self.inner.emit(event);
        }
    }

    struct Harness {
        controller: RoundController,
        sink: RecordingSink,
        stats: Arc<CameraStats>,
        picks: Arc<AtomicUsize>,
        detections: Arc<AtomicUsize>,
        detections_at_pick: Arc<Mutex<Vec<usize>>>,
    }

    fn fast_settings() -> RoundSettings {
        RoundSettings {
            countdown_ticks: 3,
            tick_interval: Duration::ZERO,
            mirror_preview: true,
        }
    }

    fn harness(
        backend: ScriptedCameraBackend,
        provider: ScriptedLandmarkProvider,
        computer: Gesture,
        settings: RoundSettings,
    ) -> Harness {
        let stats = backend.stats();
        let detections = provider.call_counter();
        let picks = Arc::new(AtomicUsize::new(0));
        let detections_at_pick = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink::default();
        let picker = FixedPicker {
            gesture: computer,
            picks: Arc::clone(&picks),
            detections: Arc::clone(&detections),
            detections_at_pick: Arc::clone(&detections_at_pick),
        };
        let controller = RoundController::new(
            Arc::new(backend),
            0,
            Box::new(provider),
            Box::new(picker),
            Box::new(sink.clone()),
            settings,
        );
        Harness {
            controller,
            sink,
            stats,
            picks,
            detections,
            detections_at_pick,
        }
    }

    fn no_stop() -> AtomicBool {
        AtomicBool::new(false)
    }

    const THUMBS_UP: FingerState = FingerState {
        thumb: true,
        index: false,
        middle: false,
        ring: false,
        pinky: false,
    };

    // ── Happy path ────────────────────────────────────────────────────────────

    #[test]
    fn test_round_resolves_after_countdown_and_first_gesture() {
        // Arrange
        let provider = ScriptedLandmarkProvider::new()
            .then_nothing(2)
            .then_pose(FingerState::VICTORY);
        let mut h = harness(
            ScriptedCameraBackend::new([0]),
            provider,
            Gesture::Rock,
            fast_settings(),
        );

        // Act
        let result = h.controller.start_round(&no_stop()).expect("round resolves");

        // Assert
        assert_eq!(result.player, Gesture::Scissors);
        assert_eq!(result.computer, Gesture::Rock);
        assert_eq!(result.outcome, Outcome::Lose);
        assert_eq!(h.controller.phase(), RoundPhase::Resolved);
        assert!(!h.controller.is_camera_acquired());
        assert_eq!(h.stats.opens(), 1);
        assert_eq!(h.stats.releases(), 1);
        assert_eq!(h.stats.reads(), 3 + 3, "three countdown frames and three capture frames");
    }

    #[test]
    fn test_event_sequence_for_resolved_round() {
        let provider = ScriptedLandmarkProvider::new().then_pose(FingerState::OPEN);
        let mut h = harness(
            ScriptedCameraBackend::new([0]),
            provider,
            Gesture::Paper,
            fast_settings(),
        );

        h.controller.start_round(&no_stop()).unwrap();

        let events = h.sink.events();
        let ticks: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                RoundEvent::CountdownTick { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![3, 2, 1]);
        assert!(matches!(events[0], RoundEvent::CountdownTick { remaining: 3, .. }));
        assert!(matches!(events[1], RoundEvent::FrameReady { .. }));
        assert!(matches!(events[6], RoundEvent::CaptureStarted { .. }));
        assert!(matches!(events[7], RoundEvent::FrameReady { .. }));
        assert_eq!(events.len(), 9);
        match &events[8] {
            RoundEvent::RoundComplete { result, .. } => assert_eq!(result.outcome, Outcome::Tie),
            other => panic!("expected RoundComplete, got {other:?}"),
        }
        let id = events[0].round_id();
        assert!(events.iter().all(|e| e.round_id() == id));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[test]
    fn test_zero_countdown_goes_straight_to_capture() {
        let provider = ScriptedLandmarkProvider::new().then_pose(FingerState::FIST);
        let settings = RoundSettings {
            countdown_ticks: 0,
            ..fast_settings()
        };
        let mut h = harness(ScriptedCameraBackend::new([0]), provider, Gesture::Scissors, settings);

        let result = h.controller.start_round(&no_stop()).unwrap();

        assert_eq!(result.outcome, Outcome::Win);
        assert!(matches!(h.sink.events()[0], RoundEvent::CaptureStarted { .. }));
    }

    // ── Move selection and locking ────────────────────────────────────────────

    #[test]
    fn test_computer_move_picked_once_before_any_detection() {
        let provider = ScriptedLandmarkProvider::new()
            .then_nothing(4)
            .then_pose(FingerState::OPEN);
        let mut h = harness(
            ScriptedCameraBackend::new([0]),
            provider,
            Gesture::Scissors,
            fast_settings(),
        );

        h.controller.start_round(&no_stop()).unwrap();

        assert_eq!(h.picks.load(Ordering::SeqCst), 1);
        assert_eq!(*h.detections_at_pick.lock().unwrap(), vec![0]);
        assert_eq!(h.detections.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_first_recognized_gesture_locks_the_round() {
        // A second, different gesture is queued but must never be classified.
        let provider = ScriptedLandmarkProvider::new()
            .then_pose(FingerState::FIST)
            .then_pose(FingerState::OPEN);
        let mut h = harness(
            ScriptedCameraBackend::new([0]),
            provider,
            Gesture::Paper,
            fast_settings(),
        );

        let result = h.controller.start_round(&no_stop()).unwrap();

        assert_eq!(result.player, Gesture::Rock);
        assert_eq!(h.detections.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unrecognized_poses_keep_capture_polling() {
        let provider = ScriptedLandmarkProvider::new()
            .then_pose(THUMBS_UP)
            .then_nothing(1)
            .then_pose(FingerState::OPEN);
        let mut h = harness(
            ScriptedCameraBackend::new([0]),
            provider,
            Gesture::Rock,
            fast_settings(),
        );

        let result = h.controller.start_round(&no_stop()).unwrap();

        assert_eq!(result.player, Gesture::Paper);
        assert_eq!(result.outcome, Outcome::Win);
        assert_eq!(h.detections.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_only_first_hand_is_classified() {
        let rock = rps_core::synthesize_hand(FingerState::FIST).points().to_vec();
        let paper = rps_core::synthesize_hand(FingerState::OPEN).points().to_vec();
        let provider = ScriptedLandmarkProvider::new().then_hands(vec![rock, paper]);
        let mut h = harness(
            ScriptedCameraBackend::new([0]),
            provider,
            Gesture::Rock,
            fast_settings(),
        );

        let result = h.controller.start_round(&no_stop()).unwrap();

        assert_eq!(result.player, Gesture::Rock);
    }

    // ── Abort paths ───────────────────────────────────────────────────────────

    #[test]
    fn test_read_failure_during_countdown_aborts_and_releases_once() {
        // Arrange
        let backend = ScriptedCameraBackend::new([0]).with_script([
            FrameStep::Frame(Frame::solid(4, 4, [0, 0, 0])),
            FrameStep::Fail("unplugged".to_string()),
        ]);
        let mut h = harness(backend, ScriptedLandmarkProvider::new(), Gesture::Rock, fast_settings());

        // Act
        let err = h.controller.start_round(&no_stop()).unwrap_err();

        // Assert
        assert_eq!(
            err,
            RoundError::Acquisition(CameraError::ReadFailed("unplugged".to_string()))
        );
        assert_eq!(h.controller.phase(), RoundPhase::Aborted);
        assert_eq!(h.stats.releases(), 1);
        assert_eq!(h.picks.load(Ordering::SeqCst), 0, "no move is picked before capturing");
        match h.sink.last() {
            Some(RoundEvent::RoundAborted { reason, .. }) => {
                assert!(reason.starts_with("Unable to access the camera"), "{reason}");
            }
            other => panic!("expected RoundAborted, got {other:?}"),
        }
    }

    #[test]
    fn test_read_failure_during_capture_aborts_and_releases_once() {
        let frame = Frame::solid(4, 4, [0, 0, 0]);
        let backend = ScriptedCameraBackend::new([0]).with_script([
            FrameStep::Frame(frame.clone()),
            FrameStep::Frame(frame.clone()),
            FrameStep::Frame(frame),
            FrameStep::Fail("bus reset".to_string()),
        ]);
        let mut h = harness(backend, ScriptedLandmarkProvider::new(), Gesture::Rock, fast_settings());

        let err = h.controller.start_round(&no_stop()).unwrap_err();

        assert!(matches!(err, RoundError::Acquisition(CameraError::ReadFailed(_))));
        assert_eq!(h.controller.phase(), RoundPhase::Aborted);
        assert_eq!(h.stats.releases(), 1);
        assert_eq!(h.picks.load(Ordering::SeqCst), 1);
        assert_eq!(h.detections.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_open_failure_aborts_without_release() {
        let mut h = harness(
            ScriptedCameraBackend::new(Vec::new()),
            ScriptedLandmarkProvider::new(),
            Gesture::Rock,
            fast_settings(),
        );

        let err = h.controller.start_round(&no_stop()).unwrap_err();

        assert!(matches!(err, RoundError::Acquisition(CameraError::OpenFailed { index: 0, .. })));
        assert_eq!(h.controller.phase(), RoundPhase::Aborted);
        assert_eq!(h.stats.releases(), 0);
        let events = h.sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RoundEvent::RoundAborted { .. }));
    }

    #[test]
    fn test_malformed_hand_aborts_round() {
        let short_hand = vec![LandmarkPoint::new(0.5, 0.5); 5];
        let provider = ScriptedLandmarkProvider::new().then_hands(vec![short_hand]);
        let mut h = harness(ScriptedCameraBackend::new([0]), provider, Gesture::Rock, fast_settings());

        let err = h.controller.start_round(&no_stop()).unwrap_err();

        assert_eq!(
            err,
            RoundError::InvalidLandmarks(ClassifyError::InvalidInput {
                expected: 21,
                actual: 5
            })
        );
        assert_eq!(h.controller.phase(), RoundPhase::Aborted);
        assert_eq!(h.stats.releases(), 1);
    }

    // ── Cancellation ──────────────────────────────────────────────────────────

    #[test]
    fn test_stop_before_start_cancels_and_returns_to_idle() {
        let mut h = harness(
            ScriptedCameraBackend::new([0]),
            ScriptedLandmarkProvider::new(),
            Gesture::Rock,
            fast_settings(),
        );

        let err = h.controller.start_round(&AtomicBool::new(true)).unwrap_err();

        assert_eq!(err, RoundError::Cancelled);
        assert_eq!(h.controller.phase(), RoundPhase::Idle);
        assert_eq!(h.stats.opens(), 1);
        assert_eq!(h.stats.releases(), 1);
        assert_eq!(h.stats.reads(), 0);
        assert!(matches!(h.sink.last(), Some(RoundEvent::RoundCancelled { .. })));
    }

    #[test]
    fn test_stop_during_capture_cancels_and_releases_once() {
        // Arrange
        let stop = Arc::new(AtomicBool::new(false));
        let backend = ScriptedCameraBackend::new([0]);
        let stats = backend.stats();
        let sink = RecordingSink::default();
        let mut controller = RoundController::new(
            Arc::new(backend),
            0,
            Box::new(StopAfter {
                stop: Arc::clone(&stop),
                remaining: 2,
            }),
            Box::new(RandomMovePicker::seeded(1)),
            Box::new(sink.clone()),
            fast_settings(),
        );

        // Act
        let err = controller.start_round(&stop).unwrap_err();

        // Assert
        assert_eq!(err, RoundError::Cancelled);
        assert_eq!(controller.phase(), RoundPhase::Idle);
        assert_eq!(stats.releases(), 1);
        assert_eq!(stats.reads(), 3 + 3);
        assert!(matches!(sink.last(), Some(RoundEvent::RoundCancelled { .. })));
        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, RoundEvent::RoundComplete { .. })));
    }

    #[test]
    fn test_stop_during_countdown_never_enters_capture() {
        // Arrange: the sink raises stop as the second tick is announced.
        let stop = Arc::new(AtomicBool::new(false));
        let backend = ScriptedCameraBackend::new([0]);
        let stats = backend.stats();
        let provider = ScriptedLandmarkProvider::new().then_pose(FingerState::FIST);
        let detections = provider.call_counter();
        let picks = Arc::new(AtomicUsize::new(0));
        let sink = StopOnTick {
            inner: RecordingSink::default(),
            stop: Arc::clone(&stop),
            tick: 2,
        };
        let recorded = sink.inner.clone();
        let mut controller = RoundController::new(
            Arc::new(backend),
            0,
            Box::new(provider),
            Box::new(FixedPicker {
                gesture: Gesture::Rock,
                picks: Arc::clone(&picks),
                detections: Arc::clone(&detections),
                detections_at_pick: Arc::new(Mutex::new(Vec::new())),
            }),
            Box::new(sink),
            fast_settings(),
        );

        // Act
        let err = controller.start_round(&stop).unwrap_err();

        // Assert
        assert_eq!(err, RoundError::Cancelled);
        assert_eq!(controller.phase(), RoundPhase::Idle);
        assert_eq!(stats.releases(), 1);
        assert_eq!(stats.reads(), 2, "ticks 3 and 2 each read one frame");
        assert_eq!(picks.load(Ordering::SeqCst), 0);
        assert_eq!(detections.load(Ordering::SeqCst), 0);
        let events = recorded.events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, RoundEvent::CaptureStarted { .. })));
        assert!(matches!(events.last(), Some(RoundEvent::RoundCancelled { .. })));
    }

    #[test]
    fn test_stop_on_last_tick_skips_capture_prompt() {
        let stop = Arc::new(AtomicBool::new(false));
        let sink = StopOnTick {
            inner: RecordingSink::default(),
            stop: Arc::clone(&stop),
            tick: 1,
        };
        let recorded = sink.inner.clone();
        let mut controller = RoundController::new(
            Arc::new(ScriptedCameraBackend::new([0])),
            0,
            Box::new(ScriptedLandmarkProvider::new()),
            Box::new(RandomMovePicker::seeded(5)),
            Box::new(sink),
            fast_settings(),
        );

        let err = controller.start_round(&stop).unwrap_err();

        assert_eq!(err, RoundError::Cancelled);
        let events = recorded.events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, RoundEvent::CaptureStarted { .. })));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[test]
    fn test_stop_cuts_countdown_sleep_short() {
        let stop = AtomicBool::new(true);
        let started = Instant::now();

        sleep_unless_stopped(Duration::from_secs(5), &stop);

        assert!(started.elapsed() < Duration::from_secs(1));
    }

    // ── Preview frames ────────────────────────────────────────────────────────

    fn red_blue() -> Frame {
        Frame::from_rgb(2, 1, vec![255, 0, 0, 0, 0, 255]).unwrap()
    }

    fn first_preview(sink: &RecordingSink) -> Arc<Frame> {
        sink.events()
            .into_iter()
            .find_map(|e| match e {
                RoundEvent::FrameReady { frame, .. } => Some(frame),
                _ => None,
            })
            .expect("a preview frame")
    }

    #[test]
    fn test_preview_is_mirrored_while_detection_sees_raw_frame() {
        // Arrange
        let backend = ScriptedCameraBackend::new([0]).with_fallback(red_blue());
        let provider = ScriptedLandmarkProvider::new().then_pose(FingerState::FIST);
        let seen = provider.last_frame();
        let settings = RoundSettings {
            countdown_ticks: 0,
            ..fast_settings()
        };
        let mut h = harness(backend, provider, Gesture::Rock, settings);

        // Act
        h.controller.start_round(&no_stop()).unwrap();

        // Assert
        let raw = seen.lock().unwrap().clone().expect("detector saw a frame");
        assert_eq!(raw.pixel(0, 0), Some([255, 0, 0]));
        assert_eq!(first_preview(&h.sink).pixel(0, 0), Some([0, 0, 255]));
    }

    #[test]
    fn test_preview_unmirrored_when_disabled() {
        let backend = ScriptedCameraBackend::new([0]).with_fallback(red_blue());
        let provider = ScriptedLandmarkProvider::new().then_pose(FingerState::FIST);
        let settings = RoundSettings {
            countdown_ticks: 1,
            mirror_preview: false,
            ..fast_settings()
        };
        let mut h = harness(backend, provider, Gesture::Rock, settings);

        h.controller.start_round(&no_stop()).unwrap();

        assert_eq!(first_preview(&h.sink).pixel(0, 0), Some([255, 0, 0]));
    }

    // ── Camera lifecycle ──────────────────────────────────────────────────────

    #[test]
    fn test_acquire_and_release_are_idempotent() {
        let mut h = harness(
            ScriptedCameraBackend::new([0]),
            ScriptedLandmarkProvider::new(),
            Gesture::Rock,
            fast_settings(),
        );

        h.controller.acquire().unwrap();
        h.controller.acquire().unwrap();
        assert!(h.controller.is_camera_acquired());
        h.controller.release();
        h.controller.release();

        assert_eq!(h.stats.opens(), 1);
        assert_eq!(h.stats.releases(), 1);
        assert!(!h.controller.is_camera_acquired());
    }

    #[test]
    fn test_reset_reopens_camera() {
        let mut h = harness(
            ScriptedCameraBackend::new([0]),
            ScriptedLandmarkProvider::new(),
            Gesture::Rock,
            fast_settings(),
        );
        h.controller.acquire().unwrap();

        h.controller.reset().unwrap();

        assert_eq!(h.stats.opens(), 2);
        assert_eq!(h.stats.releases(), 1);
        assert!(h.controller.is_camera_acquired());
    }

    #[test]
    fn test_round_started_with_camera_open_reopens_it() {
        let provider = ScriptedLandmarkProvider::new().then_pose(FingerState::FIST);
        let mut h = harness(ScriptedCameraBackend::new([0]), provider, Gesture::Rock, fast_settings());
        h.controller.acquire().unwrap();

        h.controller.start_round(&no_stop()).unwrap();

        assert_eq!(h.stats.opens(), 2);
        assert_eq!(h.stats.releases(), 2);
    }

    #[test]
    fn test_consecutive_rounds_use_fresh_state() {
        let provider = ScriptedLandmarkProvider::new()
            .then_pose(FingerState::FIST)
            .then_pose(FingerState::VICTORY);
        let mut h = harness(ScriptedCameraBackend::new([0]), provider, Gesture::Paper, fast_settings());

        let first = h.controller.start_round(&no_stop()).unwrap();
        let second = h.controller.start_round(&no_stop()).unwrap();

        assert_eq!(first.outcome, Outcome::Lose);
        assert_eq!(second.outcome, Outcome::Win);
        assert_eq!(h.picks.load(Ordering::SeqCst), 2);
        assert_eq!(h.stats.releases(), 2);
        let ids: Vec<RoundId> = h
            .sink
            .events()
            .iter()
            .filter(|e| e.is_terminal())
            .map(RoundEvent::round_id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_drop_releases_held_camera() {
        let h = harness(
            ScriptedCameraBackend::new([0]),
            ScriptedLandmarkProvider::new(),
            Gesture::Rock,
            fast_settings(),
        );
        let stats = Arc::clone(&h.stats);
        let mut controller = h.controller;
        controller.acquire().unwrap();

        drop(controller);

        assert_eq!(stats.releases(), 1);
    }

    // ── Random picker ─────────────────────────────────────────────────────────

    #[test]
    fn test_random_picker_covers_all_gestures() {
        let mut picker = RandomMovePicker::seeded(2024);
        let picks: Vec<Gesture> = (0..200).map(|_| picker.pick()).collect();
        for gesture in Gesture::ALL {
            assert!(picks.contains(&gesture), "{gesture} never picked");
        }
    }

    #[test]
    fn test_seeded_pickers_agree() {
        let mut a = RandomMovePicker::seeded(9);
        let mut b = RandomMovePicker::seeded(9);
        for _ in 0..20 {
            assert_eq!(a.pick(), b.pick());
        }
    }
}
