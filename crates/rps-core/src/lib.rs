//! # rps-core
//!
//! Shared library for gesture rock-paper-scissors containing the hand landmark
//! model, the geometric gesture classifier, and the outcome rules.
//!
//! It has zero dependencies on cameras, landmark detectors, threads, or the
//! file system.  Everything here is a pure function of its inputs.
//!
//! # Architecture overview (for beginners)
//!
//! The game watches the player through a webcam.  An external hand detector
//! turns each camera frame into 21 "landmarks" per visible hand: normalized
//! (x, y) points on the wrist, knuckles, and fingertips.  From those points
//! alone we decide whether the hand shows rock, paper, or scissors, then
//! compare it with the computer's move.
//!
//! - **`domain::landmarks`** – The landmark point type, the fixed anatomical
//!   indices (thumb tip = 4, index tip = 8, ...), and the validated
//!   21-point [`HandLandmarks`] array.
//!
//! - **`domain::classifier`** – Decides which fingers are extended and maps
//!   that to a [`Gesture`], or `None` when the pose is not a playable one.
//!
//! - **`domain::gesture`** / **`domain::outcome`** – The three playable
//!   gestures and the win/lose/tie rule table.
//!
//! The round state machine that drives a camera through a countdown and a
//! capture phase lives in the `rps-game` crate; it depends on this crate,
//! never the other way around.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `rps_core::classify` instead of `rps_core::domain::classifier::classify`.
pub use domain::classifier::{classify, classify_hand, finger_states, synthesize_hand, ClassifyError, FingerState};
pub use domain::gesture::Gesture;
pub use domain::landmarks::{HandLandmarks, LandmarkPoint, LANDMARK_COUNT};
pub use domain::outcome::{resolve, Outcome, RoundResult};
