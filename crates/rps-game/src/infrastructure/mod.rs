//! Infrastructure layer for the game.
//!
//! Contains OS-facing adapters: camera capture, hand landmark detection,
//! file-system storage, the round worker thread, and the presentation bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and `rps_core`.
//! The application layer only sees the traits declared here (`CameraBackend`,
//! `CameraDevice`, `LandmarkProvider`), never a concrete adapter.

pub mod camera;
pub mod landmarks;
pub mod storage;
pub mod ui_bridge;
pub mod worker;
