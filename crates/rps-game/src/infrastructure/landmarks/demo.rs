//! Stand-in detector for headless play.
//!
//! Until a real hand-pose model is wired in through [`LandmarkProvider`],
//! the binary uses this provider: it "sees" no hand for a few frames, then
//! holds up a random pose.  Some of the poses are deliberately unplayable
//! (a thumbs-up, three fingers) so the capture loop's keep-polling path is
//! exercised too.

use rand::{rngs::SmallRng, Rng, SeedableRng};
use rps_core::{synthesize_hand, FingerState};
use tracing::debug;

use super::{DetectedHand, LandmarkProvider};
use crate::infrastructure::camera::Frame;

/// Poses the demo player can show.
const POSES: [FingerState; 5] = [
    FingerState::FIST,
    FingerState::OPEN,
    FingerState::VICTORY,
    // Thumbs-up
    FingerState {
        thumb: true,
        index: false,
        middle: false,
        ring: false,
        pinky: false,
    },
    // Three fingers
    FingerState {
        thumb: false,
        index: true,
        middle: true,
        ring: true,
        pinky: false,
    },
];

/// Shows a random pose every `empty_frames + 1` frames.
pub struct RandomPoseProvider {
    rng: SmallRng,
    empty_frames: u32,
    since_last_pose: u32,
}

impl RandomPoseProvider {
    /// Seeds from the operating system.
    pub fn new(empty_frames: u32) -> Self {
        Self::with_rng(SmallRng::from_os_rng(), empty_frames)
    }

    /// Deterministic provider for tests.
    pub fn seeded(seed: u64, empty_frames: u32) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed), empty_frames)
    }

    fn with_rng(rng: SmallRng, empty_frames: u32) -> Self {
        Self {
            rng,
            empty_frames,
            since_last_pose: 0,
        }
    }
}

impl LandmarkProvider for RandomPoseProvider {
    fn detect(&mut self, _frame: &Frame) -> Vec<DetectedHand> {
        if self.since_last_pose < self.empty_frames {
            self.since_last_pose += 1;
            return Vec::new();
        }
        self.since_last_pose = 0;
        let fingers = POSES[self.rng.random_range(0..POSES.len())];
        debug!(?fingers, "demo hand shown");
        vec![synthesize_hand(fingers).points().to_vec()]
    }
}
