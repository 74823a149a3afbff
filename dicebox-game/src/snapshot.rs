//! Round snapshot persistence.
//!
//! The wire format for resuming an in-flight round after a process restart.
//! Sets travel as unordered integer arrays and come back as sets; anything
//! malformed or inconsistent is rejected wholesale, which callers treat the
//! same as "no saved round".

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::combos::is_partial_of_any;
use crate::constants::{BOARD_MAX, BOARD_MIN, DEFAULT_SKIP_BUDGET, DIE_FACES, LOG_RESUME};
use crate::dice::{DiceMode, DiceRoll};
use crate::result::RoundTally;
use crate::round::{Round, RoundConfig, RoundPhase};

fn default_skips() -> u8 {
    DEFAULT_SKIP_BUDGET
}

/// Serialized form of an in-flight round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub available: Vec<u8>,
    #[serde(default)]
    pub selected: Vec<u8>,
    #[serde(default)]
    pub dice: Option<DiceRoll>,
    pub phase: RoundPhase,
    #[serde(default = "default_skips")]
    pub skips_remaining: u8,
    #[serde(default)]
    pub roll_count: u32,
    #[serde(default)]
    pub dice_mode: DiceMode,
    #[serde(default = "default_skips")]
    pub skip_budget: u8,
    #[serde(default)]
    pub tally: RoundTally,
}

impl RoundSnapshot {
    /// Parse a persisted snapshot. Malformed payloads, unknown phases, and
    /// invariant violations all yield `None`.
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        let snapshot: Self = serde_json::from_str(raw).ok()?;
        snapshot.is_coherent().then_some(snapshot)
    }

    /// Serialize for the snapshot store.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Structural invariants a usable snapshot must satisfy.
    fn is_coherent(&self) -> bool {
        let in_board = |n: &u8| (BOARD_MIN..=BOARD_MAX).contains(n);
        if !self.available.iter().all(in_board) || !self.selected.iter().all(in_board) {
            return false;
        }
        let available: BTreeSet<u8> = self.available.iter().copied().collect();
        if !self.selected.iter().all(|n| available.contains(n)) {
            return false;
        }
        if self.skips_remaining > self.skip_budget {
            return false;
        }
        if let Some(roll) = self.dice {
            let face_ok = |f: u8| (1..=DIE_FACES).contains(&f);
            if !face_ok(roll.first) || !roll.second.is_none_or(face_ok) {
                return false;
            }
        }
        match self.phase {
            // A live roll is what makes the phase "rolled".
            RoundPhase::Rolled | RoundPhase::Stuck => self.dice.is_some(),
            RoundPhase::Idle => self.dice.is_none(),
            RoundPhase::GameOver | RoundPhase::Win => true,
        }
    }
}

impl Round {
    /// Capture the serializable state of this round.
    #[must_use]
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            available: self.available.iter().copied().collect(),
            selected: self.selected.iter().copied().collect(),
            dice: self.roll,
            phase: self.phase,
            skips_remaining: self.skips_remaining,
            roll_count: self.roll_count,
            dice_mode: self.config.dice_mode,
            skip_budget: self.config.skip_budget,
            tally: self.tally,
        }
    }

    /// Rebuild a round from a persisted snapshot, re-deriving the combo
    /// list and dead-roll state so a mid-roll save resumes consistently.
    /// `None` when the snapshot is not usable.
    #[must_use]
    pub fn restore(snapshot: &RoundSnapshot) -> Option<Self> {
        if !snapshot.is_coherent() {
            return None;
        }
        let config = RoundConfig {
            skip_budget: snapshot.skip_budget,
            dice_mode: snapshot.dice_mode,
        };
        let mut round = Self {
            config,
            available: snapshot.available.iter().copied().collect(),
            selected: snapshot.selected.iter().copied().collect(),
            roll: snapshot.dice,
            phase: snapshot.phase,
            dead_roll: false,
            skips_remaining: snapshot.skips_remaining,
            roll_count: snapshot.roll_count,
            tally: snapshot.tally,
            combos: Vec::new(),
            result: None,
            logs: vec![String::from(LOG_RESUME)],
        };
        if round.phase == RoundPhase::Rolled {
            round.refresh_combos();
            // The saved selection must still be a legal partial; a snapshot
            // that disagrees with the derived combos is stale or corrupt.
            if !round.selected.is_empty() {
                let target = round.target().map_or(0, u32::from);
                if round.selected_sum() > target
                    || !is_partial_of_any(round.valid_combos(), round.selected())
                {
                    return None;
                }
            }
        } else if !round.selected.is_empty() {
            // Selection only exists while a roll is live.
            return None;
        }
        Some(round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;

    fn mid_roll_round() -> Round {
        let mut round = Round::new(RoundConfig::default_config());
        let mut dice = ScriptedDice::new(&[3, 4]);
        round.roll_dice(&mut dice);
        round.toggle(2);
        round.toggle(5);
        round
    }

    #[test]
    fn roundtrip_preserves_observable_state() {
        let round = mid_roll_round();
        let json = round.snapshot().to_json();
        let snapshot = RoundSnapshot::from_json(&json).expect("snapshot parses");
        let restored = Round::restore(&snapshot).expect("snapshot restores");

        assert_eq!(restored.phase(), round.phase());
        assert_eq!(restored.available(), round.available());
        assert_eq!(restored.selected(), round.selected());
        assert_eq!(restored.roll(), round.roll());
        assert_eq!(restored.skips_remaining(), round.skips_remaining());
        assert_eq!(restored.roll_count(), round.roll_count());
        assert_eq!(restored.valid_combos(), round.valid_combos());
    }

    #[test]
    fn missing_counters_coerce_to_defaults() {
        let snapshot =
            RoundSnapshot::from_json(r#"{"available":[1,2,3],"phase":"idle"}"#).expect("parses");
        assert_eq!(snapshot.skips_remaining, DEFAULT_SKIP_BUDGET);
        assert_eq!(snapshot.skip_budget, DEFAULT_SKIP_BUDGET);
        assert_eq!(snapshot.roll_count, 0);
        assert_eq!(snapshot.dice_mode, DiceMode::Two);
        assert!(Round::restore(&snapshot).is_some());
    }

    #[test]
    fn unknown_phase_is_rejected() {
        assert!(RoundSnapshot::from_json(r#"{"available":[1],"phase":"paused"}"#).is_none());
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(RoundSnapshot::from_json("").is_none());
        assert!(RoundSnapshot::from_json("not json").is_none());
        assert!(RoundSnapshot::from_json("[1,2,3]").is_none());
    }

    #[test]
    fn selection_outside_available_is_rejected() {
        let raw = r#"{"available":[1,2],"selected":[3],"dice":{"first":3,"second":4},"phase":"rolled"}"#;
        assert!(RoundSnapshot::from_json(raw).is_none());
    }

    #[test]
    fn tiles_off_the_board_are_rejected() {
        assert!(RoundSnapshot::from_json(r#"{"available":[1,13],"phase":"idle"}"#).is_none());
        assert!(RoundSnapshot::from_json(r#"{"available":[0,2],"phase":"idle"}"#).is_none());
    }

    #[test]
    fn rolled_without_dice_is_rejected() {
        assert!(RoundSnapshot::from_json(r#"{"available":[1,2],"phase":"rolled"}"#).is_none());
    }

    #[test]
    fn impossible_die_faces_are_rejected() {
        let raw = r#"{"available":[1,2],"dice":{"first":7,"second":null},"phase":"rolled"}"#;
        assert!(RoundSnapshot::from_json(raw).is_none());
    }

    #[test]
    fn arrays_load_as_sets_regardless_of_order() {
        let raw = r#"{"available":[12,1,5,5,3],"phase":"idle"}"#;
        let snapshot = RoundSnapshot::from_json(raw).expect("parses");
        let round = Round::restore(&snapshot).expect("restores");
        let expected: BTreeSet<u8> = [1, 3, 5, 12].into_iter().collect();
        assert_eq!(round.available(), &expected);
    }

    #[test]
    fn mid_roll_restore_rederives_dead_roll() {
        // Available tiles can never make 3, one skip left: dead roll.
        let raw = r#"{"available":[8,9,10,11,12],"dice":{"first":1,"second":2},"phase":"rolled","skips_remaining":1}"#;
        let snapshot = RoundSnapshot::from_json(raw).expect("parses");
        let round = Round::restore(&snapshot).expect("restores");
        assert_eq!(round.phase(), RoundPhase::Rolled);
        assert!(round.is_dead_roll());
        assert!(round.valid_combos().is_empty());
    }

    #[test]
    fn mid_roll_restore_rederives_stuck() {
        let raw = r#"{"available":[8,9,10,11,12],"dice":{"first":1,"second":2},"phase":"rolled","skips_remaining":0,"skip_budget":5}"#;
        let snapshot = RoundSnapshot::from_json(raw).expect("parses");
        let round = Round::restore(&snapshot).expect("restores");
        assert_eq!(round.phase(), RoundPhase::Stuck);
    }

    #[test]
    fn stale_selection_is_rejected() {
        // Selection {2,5} no longer fits any combo for target 4.
        let raw = r#"{"available":[2,5,9],"selected":[2,5],"dice":{"first":2,"second":2},"phase":"rolled","skips_remaining":2}"#;
        assert!(Round::restore(&RoundSnapshot::from_json(raw).expect("parses")).is_none());
    }
}
