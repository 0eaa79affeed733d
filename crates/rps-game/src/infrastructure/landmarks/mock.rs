//! Scripted landmark provider for unit and integration tests.
//!
//! Each `detect` call pops the next queued detection result.  When the queue
//! is empty the provider reports no hands, so a capture loop driven by it
//! keeps polling until it is cancelled.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use rps_core::{synthesize_hand, FingerState};

use super::{DetectedHand, LandmarkProvider};
use crate::infrastructure::camera::Frame;

/// A provider that replays per-frame detections.
#[derive(Default)]
pub struct ScriptedLandmarkProvider {
    script: VecDeque<Vec<DetectedHand>>,
    calls: Arc<AtomicUsize>,
    last_frame: Arc<Mutex<Option<Frame>>>,
}

impl ScriptedLandmarkProvider {
    /// Creates a provider with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one frame's worth of detections.
    pub fn then_hands(mut self, hands: Vec<DetectedHand>) -> Self {
        self.script.push_back(hands);
        self
    }

    /// Queues a frame with a single hand in the given finger pose.
    pub fn then_pose(self, fingers: FingerState) -> Self {
        self.then_hands(vec![synthesize_hand(fingers).points().to_vec()])
    }

    /// Queues `count` frames with no hand visible.
    pub fn then_nothing(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.script.push_back(Vec::new());
        }
        self
    }

    /// Shared counter of `detect` calls.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Shared slot holding a copy of the most recent frame passed to `detect`.
    pub fn last_frame(&self) -> Arc<Mutex<Option<Frame>>> {
        Arc::clone(&self.last_frame)
    }
}

impl LandmarkProvider for ScriptedLandmarkProvider {
    fn detect(&mut self, frame: &Frame) -> Vec<DetectedHand> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_frame.lock().expect("lock poisoned") = Some(frame.clone());
        self.script.pop_front().unwrap_or_default()
    }
}
