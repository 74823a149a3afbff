//! Lifetime aggregate statistics.

use serde::{Deserialize, Serialize};

use crate::result::GameResult;

/// Persisted lifetime aggregates. Every field defaults, so older or partial
/// payloads keep loading and simply backfill zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Stats {
    pub games_played: u32,
    pub wins: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub perfect_shuts: u32,
    /// Fewest rolls across wins; lower is better, `None` until the first win.
    pub best_fewest_rolls: Option<u32>,
    /// Accumulated leftover across losses, feeding the average.
    pub total_leftover_sum: u32,
    pub loss_count: u32,
    pub total_three_plus_confirms: u32,
    pub total_four_plus_confirms: u32,
    pub total_skips_used: u32,
    pub best_max_combo_len: u8,
}

impl Stats {
    /// Fold one terminal result into the aggregates. The session's terminal
    /// handoff calls this exactly once per round.
    pub fn record_game(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_skips_used += u32::from(result.skips_used);
        self.total_three_plus_confirms += result.three_plus_confirms;
        self.total_four_plus_confirms += result.four_plus_confirms;
        self.best_max_combo_len = self.best_max_combo_len.max(result.max_combo_len);
        if result.is_win() {
            self.wins += 1;
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
            if result.perfect {
                self.perfect_shuts += 1;
            }
            let best = self.best_fewest_rolls.get_or_insert(result.rolls_used);
            *best = (*best).min(result.rolls_used);
        } else {
            self.current_streak = 0;
            if let Some(leftover) = result.leftover_sum {
                self.total_leftover_sum += leftover;
                self.loss_count += 1;
            }
        }
    }

    /// Win percentage over all games, 0 when none played.
    #[must_use]
    pub fn win_rate_pct(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(self.games_played) * 100.0
    }

    /// Perfect-shut percentage over all games, 0 when none played.
    #[must_use]
    pub fn perfect_rate_pct(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        f64::from(self.perfect_shuts) / f64::from(self.games_played) * 100.0
    }

    /// Average leftover across losses; `None` before the first loss.
    #[must_use]
    pub fn avg_leftover(&self) -> Option<f64> {
        if self.loss_count == 0 {
            return None;
        }
        Some(f64::from(self.total_leftover_sum) / f64::from(self.loss_count))
    }
}
