//! Terminal round results.

use serde::{Deserialize, Serialize};

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Self::Win)
    }
}

/// Running per-round confirm counters, folded into the final result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTally {
    /// Confirms that cleared three or more tiles.
    pub three_plus_confirms: u32,
    /// Confirms that cleared four or more tiles.
    pub four_plus_confirms: u32,
    /// Longest combo confirmed so far.
    pub max_combo_len: u8,
}

impl RoundTally {
    /// Account for one successful confirm of `combo_len` tiles.
    pub fn record_confirm(&mut self, combo_len: usize) {
        let len = u8::try_from(combo_len).unwrap_or(u8::MAX);
        if len >= 3 {
            self.three_plus_confirms += 1;
        }
        if len >= 4 {
            self.four_plus_confirms += 1;
        }
        self.max_combo_len = self.max_combo_len.max(len);
    }
}

/// Summary of a finished round, produced exactly once at the terminal
/// transition and handed to the stats and progression collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub outcome: Outcome,
    /// Accepted rolls only; skipped rolls are not counted.
    pub rolls_used: u32,
    /// Sum of uncleared tiles. Present on losses only.
    pub leftover_sum: Option<u32>,
    /// True when no skip was spent this round.
    pub perfect: bool,
    pub skips_used: u8,
    pub three_plus_confirms: u32,
    pub four_plus_confirms: u32,
    pub max_combo_len: u8,
}

impl GameResult {
    #[must_use]
    pub const fn is_win(&self) -> bool {
        self.outcome.is_win()
    }
}
