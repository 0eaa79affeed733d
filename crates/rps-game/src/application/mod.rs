//! Application layer use cases for the game.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure game rules in `rps-core`) and the infrastructure (cameras, files,
//! threads, channels).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "play one
//!   round against the computer").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so a real webcam and a scripted test camera are interchangeable.
//! - **Contain no OS calls and no file system access**.  Blocking happens only
//!   through the injected camera and the countdown sleep.
//!
//! # Sub-modules
//!
//! - **`play_round`**    – The round state machine: countdown, capture,
//!   classification, outcome.  Owns the camera while a round runs.
//!
//! - **`select_camera`** – Probes candidate device indices and picks the first
//!   camera that opens.

pub mod play_round;
pub mod select_camera;
