//! Domain entities for gesture rock-paper-scissors.
//!
//! This module contains pure game logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of the application holds the rules that make the game
//! what it is: how a hand pose becomes a gesture, and which gesture beats
//! which.  Domain code:
//!
//! - Has **no** imports from camera APIs, ML runtimes, threads, or UI code.
//! - Can be compiled and tested on any machine without a webcam.
//!
//! Outer layers (the round controller, camera adapters, the binary) depend on
//! the domain; the domain never depends on them.

/// Landmark points and the fixed 21-point hand skeleton.
pub mod landmarks;

/// Finger extension tests and gesture classification.
pub mod classifier;

/// The three playable gestures.
pub mod gesture;

/// Win / lose / tie resolution.
pub mod outcome;
