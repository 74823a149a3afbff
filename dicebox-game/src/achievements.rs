//! Achievement catalog and evaluation.
//!
//! Rules read the just-finished round result together with the already
//! updated lifetime stats; result-based and stats-based conditions stay
//! independent predicates even where they look related (a perfect shut and
//! a fast win are different things).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::{
    COMBO3_CONFIRMS_TARGET, COMBO4_CONFIRMS_TARGET, SPEED_RUN_MAX_ROLLS, STREAK_TARGET,
    TIGHT_LOSS_MAX_LEFTOVER, WINS_TARGET,
};
use crate::progression::{CosmeticGrant, CosmeticSlot};
use crate::result::GameResult;
use crate::stats::Stats;

/// Stable achievement identifiers, serialized as the snake_case ids the
/// progression store keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AchievementId {
    #[serde(rename = "first_win")]
    FirstWin,
    #[serde(rename = "perfect_shut")]
    PerfectShut,
    #[serde(rename = "tight_loss")]
    TightLoss,
    #[serde(rename = "streak_3")]
    Streak3,
    #[serde(rename = "wins_10")]
    Wins10,
    #[serde(rename = "combo_3_master")]
    Combo3Master,
    #[serde(rename = "combo_4_master")]
    Combo4Master,
    #[serde(rename = "speed_runner")]
    SpeedRunner,
}

impl AchievementId {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FirstWin => "first_win",
            Self::PerfectShut => "perfect_shut",
            Self::TightLoss => "tight_loss",
            Self::Streak3 => "streak_3",
            Self::Wins10 => "wins_10",
            Self::Combo3Master => "combo_3_master",
            Self::Combo4Master => "combo_4_master",
            Self::SpeedRunner => "speed_runner",
        }
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Evaluation context handed to every rule.
#[derive(Debug, Clone, Copy)]
pub struct EvalCtx<'a> {
    pub result: &'a GameResult,
    pub stats: &'a Stats,
}

/// One catalog entry. Rewards are cosmetic-only; unlocking never changes
/// core behavior.
pub struct Achievement {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rule: fn(EvalCtx<'_>) -> bool,
    pub rewards: &'static [CosmeticGrant],
}

fn rule_first_win(ctx: EvalCtx<'_>) -> bool {
    ctx.result.is_win()
}

fn rule_perfect_shut(ctx: EvalCtx<'_>) -> bool {
    ctx.result.is_win() && ctx.result.perfect
}

fn rule_tight_loss(ctx: EvalCtx<'_>) -> bool {
    !ctx.result.is_win()
        && ctx
            .result
            .leftover_sum
            .is_some_and(|left| left <= TIGHT_LOSS_MAX_LEFTOVER)
}

fn rule_streak_3(ctx: EvalCtx<'_>) -> bool {
    ctx.stats.current_streak >= STREAK_TARGET
}

fn rule_wins_10(ctx: EvalCtx<'_>) -> bool {
    ctx.stats.wins >= WINS_TARGET
}

fn rule_combo_3_master(ctx: EvalCtx<'_>) -> bool {
    ctx.stats.total_three_plus_confirms >= COMBO3_CONFIRMS_TARGET
}

fn rule_combo_4_master(ctx: EvalCtx<'_>) -> bool {
    ctx.stats.total_four_plus_confirms >= COMBO4_CONFIRMS_TARGET
}

fn rule_speed_runner(ctx: EvalCtx<'_>) -> bool {
    ctx.result.is_win() && ctx.result.rolls_used <= SPEED_RUN_MAX_ROLLS
}

/// Full catalog, ordered as presented to the player.
pub static ACHIEVEMENTS: [Achievement; 8] = [
    // Early retention / first-session goals
    Achievement {
        id: AchievementId::FirstWin,
        title: "First Win",
        description: "Win one game.",
        icon: "\u{1f3c6}",
        rule: rule_first_win,
        rewards: &[CosmeticGrant {
            slot: CosmeticSlot::DiceSkin,
            id: "gold",
        }],
    },
    Achievement {
        id: AchievementId::PerfectShut,
        title: "Perfect Shut",
        description: "Win without using any skips.",
        icon: "\u{2728}",
        rule: rule_perfect_shut,
        rewards: &[CosmeticGrant {
            slot: CosmeticSlot::Confetti,
            id: "sparkles",
        }],
    },
    Achievement {
        id: AchievementId::TightLoss,
        title: "Tight Loss",
        description: "Lose with leftover \u{2264} 6.",
        icon: "\u{1f3af}",
        rule: rule_tight_loss,
        rewards: &[CosmeticGrant {
            slot: CosmeticSlot::TileTheme,
            id: "slate",
        }],
    },
    // Short/medium-term progression
    Achievement {
        id: AchievementId::Streak3,
        title: "On a Roll",
        description: "Reach a 3-win streak.",
        icon: "\u{1f525}",
        rule: rule_streak_3,
        rewards: &[CosmeticGrant {
            slot: CosmeticSlot::Theme,
            id: "midnight",
        }],
    },
    Achievement {
        id: AchievementId::Wins10,
        title: "Tenacious",
        description: "Win 10 games total.",
        icon: "\u{1f4aa}",
        rule: rule_wins_10,
        rewards: &[CosmeticGrant {
            slot: CosmeticSlot::DiceSkin,
            id: "neon",
        }],
    },
    // Skill expression
    Achievement {
        id: AchievementId::Combo3Master,
        title: "Combo Master",
        description: "Make 10 confirms using 3+ tiles (lifetime).",
        icon: "\u{1f517}",
        rule: rule_combo_3_master,
        rewards: &[CosmeticGrant {
            slot: CosmeticSlot::Confetti,
            id: "fireworks",
        }],
    },
    Achievement {
        id: AchievementId::Combo4Master,
        title: "Big Brain",
        description: "Make 5 confirms using 4+ tiles (lifetime).",
        icon: "\u{1f9e0}",
        rule: rule_combo_4_master,
        rewards: &[CosmeticGrant {
            slot: CosmeticSlot::TileTheme,
            id: "glass",
        }],
    },
    // Efficiency challenge
    Achievement {
        id: AchievementId::SpeedRunner,
        title: "Speed Runner",
        description: "Win in 7 rolls or fewer.",
        icon: "\u{26a1}",
        rule: rule_speed_runner,
        rewards: &[CosmeticGrant {
            slot: CosmeticSlot::DiceSkin,
            id: "carbon",
        }],
    },
];

/// Newly unlocked achievement ids for a finished round: rules that pass and
/// are not already owned.
#[must_use]
pub fn evaluate(
    result: &GameResult,
    stats: &Stats,
    owned: &BTreeSet<AchievementId>,
) -> Vec<AchievementId> {
    let ctx = EvalCtx { result, stats };
    ACHIEVEMENTS
        .iter()
        .filter(|entry| !owned.contains(&entry.id) && (entry.rule)(ctx))
        .map(|entry| entry.id)
        .collect()
}

/// Catalog entry lookup.
#[must_use]
pub fn meta(id: AchievementId) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|entry| entry.id == id)
}

/// Flatten the cosmetic rewards carried by newly unlocked ids.
#[must_use]
pub fn rewards_for(ids: &[AchievementId]) -> Vec<CosmeticGrant> {
    ids.iter()
        .filter_map(|&id| meta(id))
        .flat_map(|entry| entry.rewards.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Outcome;

    fn result(outcome: Outcome, rolls: u32, leftover: Option<u32>, perfect: bool) -> GameResult {
        GameResult {
            outcome,
            rolls_used: rolls,
            leftover_sum: leftover,
            perfect,
            skips_used: u8::from(!perfect),
            three_plus_confirms: 0,
            four_plus_confirms: 0,
            max_combo_len: 1,
        }
    }

    #[test]
    fn first_win_and_perfect_shut_unlock_together() {
        let win = result(Outcome::Win, 11, None, true);
        let mut stats = Stats::default();
        stats.record_game(&win);
        let unlocked = evaluate(&win, &stats, &BTreeSet::new());
        assert!(unlocked.contains(&AchievementId::FirstWin));
        assert!(unlocked.contains(&AchievementId::PerfectShut));
        assert!(!unlocked.contains(&AchievementId::SpeedRunner));
    }

    #[test]
    fn speed_runner_is_independent_of_perfect() {
        let win = result(Outcome::Win, 7, None, false);
        let mut stats = Stats::default();
        stats.record_game(&win);
        let unlocked = evaluate(&win, &stats, &BTreeSet::new());
        assert!(unlocked.contains(&AchievementId::SpeedRunner));
        assert!(!unlocked.contains(&AchievementId::PerfectShut));
    }

    #[test]
    fn tight_loss_boundary() {
        let mut stats = Stats::default();
        let near = result(Outcome::Loss, 5, Some(6), false);
        stats.record_game(&near);
        assert!(evaluate(&near, &stats, &BTreeSet::new()).contains(&AchievementId::TightLoss));

        let wide = result(Outcome::Loss, 5, Some(7), false);
        stats.record_game(&wide);
        assert!(!evaluate(&wide, &stats, &BTreeSet::new()).contains(&AchievementId::TightLoss));
    }

    #[test]
    fn owned_ids_never_reunlock() {
        let win = result(Outcome::Win, 9, None, false);
        let mut stats = Stats::default();
        stats.record_game(&win);
        let owned: BTreeSet<AchievementId> = [AchievementId::FirstWin].into_iter().collect();
        let unlocked = evaluate(&win, &stats, &owned);
        assert!(!unlocked.contains(&AchievementId::FirstWin));
    }

    #[test]
    fn streak_and_lifetime_counters_trigger() {
        let win = result(Outcome::Win, 10, None, false);
        let mut stats = Stats::default();
        stats.current_streak = 3;
        stats.wins = 10;
        stats.total_three_plus_confirms = 10;
        stats.total_four_plus_confirms = 5;
        let unlocked = evaluate(&win, &stats, &BTreeSet::new());
        assert!(unlocked.contains(&AchievementId::Streak3));
        assert!(unlocked.contains(&AchievementId::Wins10));
        assert!(unlocked.contains(&AchievementId::Combo3Master));
        assert!(unlocked.contains(&AchievementId::Combo4Master));
    }

    #[test]
    fn rewards_flatten_in_order() {
        let rewards = rewards_for(&[AchievementId::FirstWin, AchievementId::PerfectShut]);
        assert_eq!(rewards.len(), 2);
        assert_eq!(rewards[0].slot, CosmeticSlot::DiceSkin);
        assert_eq!(rewards[0].id, "gold");
        assert_eq!(rewards[1].slot, CosmeticSlot::Confetti);
        assert_eq!(rewards[1].id, "sparkles");
    }

    #[test]
    fn ids_roundtrip_through_serde_keys() {
        for entry in &ACHIEVEMENTS {
            let json = serde_json::to_string(&entry.id).unwrap();
            assert_eq!(json, format!("\"{}\"", entry.id.key()));
            let back: AchievementId = serde_json::from_str(&json).unwrap();
            assert_eq!(back, entry.id);
        }
    }
}
