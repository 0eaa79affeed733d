//! Hand landmark types.
//!
//! A landmark detector reports each visible hand as 21 points in a fixed
//! anatomical order.  Coordinates are normalized to the frame: `x` grows to
//! the right, `y` grows downward, both in `[0, 1]`.  `z` is relative depth and
//! is `0.0` when the detector does not provide it.
//!
//! ```text
//!            8   12  16  20        tips
//!            7   11  15  19        DIP joints
//!    4       6   10  14  18        PIP joints
//!     3      5   9   13  17        MCP knuckles
//!      2
//!       1
//!             0                    wrist
//! ```

use serde::{Deserialize, Serialize};

use super::classifier::ClassifyError;

/// Number of landmarks reported for every detected hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// A single normalized point on the hand skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Horizontal position, `0.0` = left edge of the frame.
    pub x: f32,
    /// Vertical position, `0.0` = top edge of the frame.
    pub y: f32,
    /// Relative depth; `0.0` when unavailable.
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    /// Creates a 2-D point with zero depth.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Creates a 3-D point.
    pub const fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Exactly [`LANDMARK_COUNT`] points for one detected hand.
///
/// Construct it with [`HandLandmarks::from_slice`] (or `TryFrom`) so the
/// point count is checked once at the boundary; everything downstream can
/// index by the anatomical constants without bounds worries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    points: [LandmarkPoint; LANDMARK_COUNT],
}

impl HandLandmarks {
    /// Wraps an already sized array.
    pub const fn new(points: [LandmarkPoint; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Validates and copies a detector's point list.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::InvalidInput`] if `points` does not hold
    /// exactly [`LANDMARK_COUNT`] entries.
    pub fn from_slice(points: &[LandmarkPoint]) -> Result<Self, ClassifyError> {
        let points: [LandmarkPoint; LANDMARK_COUNT] =
            points.try_into().map_err(|_| ClassifyError::InvalidInput {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            })?;
        Ok(Self { points })
    }

    /// Returns the point at an anatomical index (see the module constants).
    ///
    /// # Panics
    ///
    /// Panics if `index >= LANDMARK_COUNT`.
    pub fn point(&self, index: usize) -> LandmarkPoint {
        self.points[index]
    }

    /// Returns all 21 points in anatomical order.
    pub fn points(&self) -> &[LandmarkPoint; LANDMARK_COUNT] {
        &self.points
    }
}

impl TryFrom<&[LandmarkPoint]> for HandLandmarks {
    type Error = ClassifyError;

    fn try_from(points: &[LandmarkPoint]) -> Result<Self, Self::Error> {
        Self::from_slice(points)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
