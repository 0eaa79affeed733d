//! Geometric gesture classifier.
//!
//! No learned model is involved.  Each finger is tested for extension by
//! comparing two of its landmarks, and the resulting five booleans are
//! matched against the three playable poses.
//!
//! # Finger extension rules
//!
//! - **Index, middle, ring, pinky**: extended when the fingertip sits higher
//!   in the frame than the finger's PIP joint, i.e. `tip.y < pip.y` (image
//!   `y` grows downward).
//! - **Thumb**: the thumb folds sideways across the palm rather than
//!   downward, so it is tested horizontally: extended when `tip.x > ip.x`.
//!   This assumes a right hand, palm toward the camera, in the raw
//!   (unmirrored) frame.  A left hand or a mirrored frame flips the result.
//!
//! # Classification order
//!
//! 1. nothing extended → [`Gesture::Rock`]
//! 2. everything extended → [`Gesture::Paper`]
//! 3. only index and middle extended → [`Gesture::Scissors`]
//! 4. anything else → `None`

use thiserror::Error;
use tracing::trace;

use super::gesture::Gesture;
use super::landmarks::{
    HandLandmarks, LandmarkPoint, INDEX_DIP, INDEX_MCP, INDEX_PIP, INDEX_TIP, LANDMARK_COUNT,
    MIDDLE_DIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, PINKY_DIP, PINKY_MCP, PINKY_PIP, PINKY_TIP,
    RING_DIP, RING_MCP, RING_PIP, RING_TIP, THUMB_CMC, THUMB_IP, THUMB_MCP, THUMB_TIP, WRIST,
};

/// (tip, PIP) landmark pairs for the four non-thumb fingers, index first.
const FINGER_JOINTS: [(usize, usize); 4] = [
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (PINKY_TIP, PINKY_PIP),
];

/// Errors raised by the classifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// The caller passed a point list of the wrong length.  This is a
    /// contract violation by the landmark source, not a recoverable pose.
    #[error("expected {expected} hand landmarks, got {actual}")]
    InvalidInput { expected: usize, actual: usize },
}

/// Which fingers of one hand are extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerState {
    /// All five fingers folded (a fist).
    pub const FIST: FingerState = FingerState {
        thumb: false,
        index: false,
        middle: false,
        ring: false,
        pinky: false,
    };

    /// All five fingers extended (an open palm).
    pub const OPEN: FingerState = FingerState {
        thumb: true,
        index: true,
        middle: true,
        ring: true,
        pinky: true,
    };

    /// Index and middle extended, everything else folded.
    pub const VICTORY: FingerState = FingerState {
        thumb: false,
        index: true,
        middle: true,
        ring: false,
        pinky: false,
    };

    /// Builds a state from a 5-bit mask: bit 0 = thumb … bit 4 = pinky.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            thumb: bits & 0b00001 != 0,
            index: bits & 0b00010 != 0,
            middle: bits & 0b00100 != 0,
            ring: bits & 0b01000 != 0,
            pinky: bits & 0b10000 != 0,
        }
    }

    fn as_array(self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    /// Number of extended fingers, thumb included.
    pub fn extended_count(self) -> usize {
        self.as_array().iter().filter(|&&up| up).count()
    }

    /// Maps the finger pattern to a playable gesture.
    pub fn gesture(self) -> Option<Gesture> {
        match self {
            s if s.extended_count() == 0 => Some(Gesture::Rock),
            s if s.extended_count() == 5 => Some(Gesture::Paper),
            FingerState::VICTORY => Some(Gesture::Scissors),
            _ => None,
        }
    }
}

/// Computes which fingers are extended.
pub fn finger_states(hand: &HandLandmarks) -> FingerState {
    let extended = |(tip, pip): (usize, usize)| hand.point(tip).y < hand.point(pip).y;

    FingerState {
        thumb: hand.point(THUMB_TIP).x > hand.point(THUMB_IP).x,
        index: extended(FINGER_JOINTS[0]),
        middle: extended(FINGER_JOINTS[1]),
        ring: extended(FINGER_JOINTS[2]),
        pinky: extended(FINGER_JOINTS[3]),
    }
}

/// Classifies an already validated hand.
pub fn classify_hand(hand: &HandLandmarks) -> Option<Gesture> {
    let fingers = finger_states(hand);
    let gesture = fingers.gesture();
    trace!(?fingers, ?gesture, "classified hand");
    gesture
}

/// Classifies one hand's raw landmark list.
///
/// Returns `Ok(None)` for a valid hand whose pose is not rock, paper, or
/// scissors.
///
/// # Errors
///
/// Returns [`ClassifyError::InvalidInput`] if `landmarks` does not hold
/// exactly [`LANDMARK_COUNT`] points.
pub fn classify(landmarks: &[LandmarkPoint]) -> Result<Option<Gesture>, ClassifyError> {
    let hand = HandLandmarks::from_slice(landmarks)?;
    Ok(classify_hand(&hand))
}

// ── Synthetic hands ───────────────────────────────────────────────────────────

/// Column `x` of each non-thumb finger, index first.  The index finger sits
/// nearest the thumb, which for a right hand in the raw frame is on the right.
const FINGER_COLUMNS: [f32; 4] = [0.55, 0.50, 0.45, 0.40];

/// Builds a plausible right-hand skeleton whose [`finger_states`] equal
/// `fingers`.
///
/// Used by the demo landmark source and by tests to produce poses without a
/// real detector.
pub fn synthesize_hand(fingers: FingerState) -> HandLandmarks {
    let mut points = [LandmarkPoint::default(); LANDMARK_COUNT];
    points[WRIST] = LandmarkPoint::new(0.50, 0.85);

    points[THUMB_CMC] = LandmarkPoint::new(0.58, 0.78);
    points[THUMB_MCP] = LandmarkPoint::new(0.63, 0.72);
    points[THUMB_IP] = LandmarkPoint::new(0.67, 0.66);
    points[THUMB_TIP] = if fingers.thumb {
        LandmarkPoint::new(0.72, 0.60)
    } else {
        // Tucked across the palm.
        LandmarkPoint::new(0.60, 0.64)
    };

    let finger_indices = [
        (INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP),
        (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP),
        (RING_MCP, RING_PIP, RING_DIP, RING_TIP),
        (PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP),
    ];
    let up = [fingers.index, fingers.middle, fingers.ring, fingers.pinky];

    for (((mcp, pip, dip, tip), x), extended) in
        finger_indices.into_iter().zip(FINGER_COLUMNS).zip(up)
    {
        points[mcp] = LandmarkPoint::new(x, 0.60);
        points[pip] = LandmarkPoint::new(x, 0.50);
        if extended {
            points[dip] = LandmarkPoint::new(x, 0.42);
            points[tip] = LandmarkPoint::new(x, 0.35);
        } else {
            points[dip] = LandmarkPoint::new(x, 0.55);
            points[tip] = LandmarkPoint::new(x, 0.58);
        }
    }

    HandLandmarks::new(points)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_with(fingers: FingerState) -> HandLandmarks {
        synthesize_hand(fingers)
    }

    // ── Finger extension ──────────────────────────────────────────────────────

    #[test]
    fn test_synthesized_hand_round_trips_every_finger_combination() {
        for bits in 0..32u8 {
            let fingers = FingerState::from_bits(bits);
            assert_eq!(finger_states(&hand_with(fingers)), fingers, "bits={bits:05b}");
        }
    }

    #[test]
    fn test_thumb_tip_left_of_ip_joint_is_folded() {
        // Arrange
        let mut points = *hand_with(FingerState::FIST).points();
        points[THUMB_IP] = LandmarkPoint::new(0.50, 0.60);
        points[THUMB_TIP] = LandmarkPoint::new(0.45, 0.60);

        // Act
        let fingers = finger_states(&HandLandmarks::new(points));

        // Assert
        assert!(!fingers.thumb);
    }

    #[test]
    fn test_fingertip_level_with_pip_counts_as_folded() {
        // The comparison is strict: equal heights are not "above".
        let mut points = *hand_with(FingerState::OPEN).points();
        points[INDEX_TIP].y = points[INDEX_PIP].y;

        let fingers = finger_states(&HandLandmarks::new(points));

        assert!(!fingers.index);
        assert!(fingers.middle);
    }

    // ── Gesture mapping ───────────────────────────────────────────────────────

    #[test]
    fn test_fist_is_rock() {
        assert_eq!(classify_hand(&hand_with(FingerState::FIST)), Some(Gesture::Rock));
    }

    #[test]
    fn test_open_palm_is_paper() {
        assert_eq!(classify_hand(&hand_with(FingerState::OPEN)), Some(Gesture::Paper));
    }

    #[test]
    fn test_index_and_middle_is_scissors() {
        assert_eq!(classify_hand(&hand_with(FingerState::VICTORY)), Some(Gesture::Scissors));
    }

    #[test]
    fn test_thumbs_up_is_unrecognized() {
        let thumbs_up = FingerState {
            thumb: true,
            ..FingerState::FIST
        };
        assert_eq!(classify_hand(&hand_with(thumbs_up)), None);
    }

    #[test]
    fn test_scissors_with_thumb_out_is_unrecognized() {
        let fingers = FingerState {
            thumb: true,
            ..FingerState::VICTORY
        };
        assert_eq!(classify_hand(&hand_with(fingers)), None);
    }

    #[test]
    fn test_every_partial_combination_except_victory_is_unrecognized() {
        for bits in 1..31u8 {
            let fingers = FingerState::from_bits(bits);
            let expected = if fingers == FingerState::VICTORY {
                Some(Gesture::Scissors)
            } else {
                None
            };
            assert_eq!(fingers.gesture(), expected, "bits={bits:05b}");
        }
    }

    #[test]
    fn test_extended_count_counts_thumb() {
        assert_eq!(FingerState::OPEN.extended_count(), 5);
        assert_eq!(FingerState::VICTORY.extended_count(), 2);
        assert_eq!(FingerState::FIST.extended_count(), 0);
    }

    // ── Raw input validation ──────────────────────────────────────────────────

    #[test]
    fn test_classify_accepts_raw_slice() {
        let hand = hand_with(FingerState::OPEN);
        assert_eq!(classify(hand.points()), Ok(Some(Gesture::Paper)));
    }

    #[test]
    fn test_classify_rejects_wrong_point_count() {
        let points = vec![LandmarkPoint::default(); 42];
        assert_eq!(
            classify(&points),
            Err(ClassifyError::InvalidInput {
                expected: LANDMARK_COUNT,
                actual: 42
            })
        );
    }
}
