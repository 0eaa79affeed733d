//! SelectCamera: find the first camera index that can be opened.
//!
//! A liveness probe, nothing more.  Candidate indices are tried in order,
//! internal cameras first (laptop webcams usually enumerate as 0 or 1), then
//! external ones.  Each probe opens the device and releases it immediately;
//! the round controller reopens the chosen index when a round starts.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::camera::CameraBackend;

/// Errors from camera selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no camera found after probing {probed} device index(es)")]
    NoCameraFound { probed: usize },
}

/// Where a candidate index comes from.  Only used for log wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    Internal,
    External,
}

impl CameraKind {
    fn label(self) -> &'static str {
        match self {
            CameraKind::Internal => "internal",
            CameraKind::External => "external",
        }
    }
}

/// Ordered device indices to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraCandidates {
    pub internal: Vec<u32>,
    pub external: Vec<u32>,
}

impl Default for CameraCandidates {
    /// Internal `0..=1`, external `2..=9`.
    fn default() -> Self {
        Self {
            internal: vec![0, 1],
            external: (2..=9).collect(),
        }
    }
}

impl CameraCandidates {
    /// All candidates in probe order.
    pub fn ordered(&self) -> impl Iterator<Item = (CameraKind, u32)> + '_ {
        self.internal
            .iter()
            .map(|&i| (CameraKind::Internal, i))
            .chain(self.external.iter().map(|&i| (CameraKind::External, i)))
    }
}

/// Returns the first candidate index that opens successfully.
///
/// # Errors
///
/// Returns [`SelectError::NoCameraFound`] when every candidate fails to open
/// (including when there are no candidates).
pub fn select_camera(
    backend: &dyn CameraBackend,
    candidates: &CameraCandidates,
) -> Result<u32, SelectError> {
    let mut probed = 0;
    for (kind, index) in candidates.ordered() {
        probed += 1;
        match backend.open(index) {
            Ok(mut device) => {
                device.release();
                info!("{} camera found at index {index}", kind.label());
                return Ok(index);
            }
            Err(e) => debug!("no {} camera at index {index}: {e}", kind.label()),
        }
    }
    warn!("no cameras detected");
    Err(SelectError::NoCameraFound { probed })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
