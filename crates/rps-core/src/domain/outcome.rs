//! Outcome resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::gesture::Gesture;

/// Result of one round from the player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Tie,
}

impl Outcome {
    /// Human-readable headline shown on the result screen.
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Win => "You win!",
            Outcome::Lose => "You lose!",
            Outcome::Tie => "It's a tie!",
        }
    }

    /// Short lowercase tag (`"win"`, `"lose"`, `"tie"`).  Presentation code
    /// keys result artwork and sounds off this value.
    pub fn tag(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Lose => "lose",
            Outcome::Tie => "tie",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Decides the round from the player's perspective.
///
/// Total over all nine input pairs.
pub fn resolve(player: Gesture, computer: Gesture) -> Outcome {
    if player == computer {
        Outcome::Tie
    } else if player.beats(computer) {
        Outcome::Win
    } else {
        Outcome::Lose
    }
}

/// Everything the presentation layer needs once a round has been decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub player: Gesture,
    pub computer: Gesture,
    pub outcome: Outcome,
}

impl RoundResult {
    /// Resolves `player` against `computer`.
    pub fn new(player: Gesture, computer: Gesture) -> Self {
        Self {
            player,
            computer,
            outcome: resolve(player, computer),
        }
    }

    /// The line shown while both moves are revealed,
    /// e.g. `"Computer: Rock | You: Paper"`.
    pub fn reveal_line(&self) -> String {
        format!("Computer: {} | You: {}", self.computer, self.player)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
