//! The three playable gestures.
//!
//! An unrecognized pose is not a `Gesture`; the classifier reports it as
//! `Option::<Gesture>::None`.  That keeps "the player has not shown anything
//! playable yet" out of the resolver's input domain entirely.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A playable rock-paper-scissors symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gesture {
    Rock,
    Paper,
    Scissors,
}

impl Gesture {
    /// Every playable gesture, in a fixed order.  The computer samples
    /// uniformly from this list.
    pub const ALL: [Gesture; 3] = [Gesture::Rock, Gesture::Paper, Gesture::Scissors];

    /// Returns `true` if `self` defeats `other`.
    ///
    /// Rock blunts Scissors, Scissors cut Paper, Paper covers Rock.
    pub fn beats(self, other: Gesture) -> bool {
        matches!(
            (self, other),
            (Gesture::Rock, Gesture::Scissors)
                | (Gesture::Scissors, Gesture::Paper)
                | (Gesture::Paper, Gesture::Rock)
        )
    }

    /// Display name, e.g. `"Rock"`.
    pub fn name(self) -> &'static str {
        match self {
            Gesture::Rock => "Rock",
            Gesture::Paper => "Paper",
            Gesture::Scissors => "Scissors",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_gesture_beats_exactly_one_other() {
        for g in Gesture::ALL {
            let wins = Gesture::ALL.iter().filter(|&&o| g.beats(o)).count();
            assert_eq!(wins, 1, "{g} must beat exactly one gesture");
        }
    }

    #[test]
    fn test_no_gesture_beats_itself() {
        for g in Gesture::ALL {
            assert!(!g.beats(g));
        }
    }

    #[test]
    fn test_display_uses_capitalised_name() {
        assert_eq!(Gesture::Scissors.to_string(), "Scissors");
        assert_eq!(format!("{}", Gesture::Rock), "Rock");
    }

    #[test]
    fn test_gesture_serializes_as_variant_name() {
        let json = serde_json::to_string(&Gesture::Paper).unwrap();
        assert_eq!(json, r#""Paper""#);
    }
}
