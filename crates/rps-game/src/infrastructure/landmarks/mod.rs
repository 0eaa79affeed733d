//! Hand landmark detection seam.
//!
//! Detecting hands in an image is an external capability (a hand-pose model
//! running in some inference runtime).  The game only needs its output: for
//! each visible hand, the 21 normalized landmark points in anatomical order.
//!
//! Providers return raw point lists rather than validated
//! [`rps_core::HandLandmarks`], because that is what detectors hand back.
//! Validation happens once in the round controller, which treats a
//! wrong-sized hand as a contract violation.
//!
//! # Implementations
//!
//! - [`mock::ScriptedLandmarkProvider`] replays queued detections; used by tests.
//! - [`demo::RandomPoseProvider`] invents a new pose every few frames; used by
//!   the binary until a real detector is plugged in.

use rps_core::LandmarkPoint;

use super::camera::Frame;

pub mod demo;
pub mod mock;

/// One detected hand as reported by a detector.
pub type DetectedHand = Vec<LandmarkPoint>;

/// Maps an image frame to zero or more detected hands.
pub trait LandmarkProvider: Send {
    /// Runs detection on `frame`.  An empty list means no hand is visible.
    fn detect(&mut self, frame: &Frame) -> Vec<DetectedHand>;
}
