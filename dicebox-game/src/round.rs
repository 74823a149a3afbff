//! Turn state machine for a single DiceBox round.
//!
//! Owns all mutable round state (available set, roll, selection, counters,
//! phase) and applies player actions against the combination engine's
//! output. Every operation either completes a deterministic transition or
//! rejects without mutating anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::combos::{Combo, is_exact_combo, is_partial_of_any, valid_combos};
use crate::constants::{
    BOARD_MAX, BOARD_MIN, DEFAULT_SKIP_BUDGET, LOG_CONFIRM, LOG_DEAD_ROLL, LOG_GIVE_UP,
    LOG_NEW_ROUND, LOG_ROLL, LOG_SKIP, LOG_STUCK, LOG_WIN,
};
use crate::dice::{DiceMode, DiceRoll, DiceSource};
use crate::result::{GameResult, Outcome, RoundTally};

/// Lifecycle phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    /// Awaiting a roll choice.
    #[default]
    Idle,
    /// Dice shown, selection open.
    Rolled,
    /// Zero combos and zero skips; only giving up remains.
    Stuck,
    /// Conceded from stuck. Terminal.
    GameOver,
    /// Board cleared. Terminal.
    Win,
}

impl RoundPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Rolled => "rolled",
            Self::Stuck => "stuck",
            Self::GameOver => "gameover",
            Self::Win => "win",
        }
    }

    /// Whether the round is finished for good.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Win)
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables fixed at round start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// How many rolls may be discarded before the round locks into stuck.
    pub skip_budget: u8,
    pub dice_mode: DiceMode,
}

impl RoundConfig {
    #[must_use]
    pub const fn default_config() -> Self {
        Self {
            skip_budget: DEFAULT_SKIP_BUDGET,
            dice_mode: DiceMode::Two,
        }
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Rejection reasons for [`Round::confirm`]. The only user-facing errors in
/// the engine; everything else rejects as a silent no-op.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ConfirmError {
    #[error("selected tiles total {selected}, need exactly {target}")]
    SumMismatch { selected: u32, target: u32 },
    #[error("selection is not one of the valid combinations")]
    NotACombo,
}

/// Result of a confirm attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Selection cleared; the round moved to this phase (idle or win).
    Cleared(RoundPhase),
    /// User-facing rejection; state unchanged.
    Rejected(ConfirmError),
    /// Confirm does not apply in the current phase; state unchanged.
    NotApplicable,
}

impl ConfirmOutcome {
    #[must_use]
    pub const fn cleared(self) -> bool {
        matches!(self, Self::Cleared(_))
    }
}

/// State machine owning all mutable state for one round.
///
/// The combo list is derived data: a pure function of the available set and
/// the current roll, refreshed whenever either changes, never mutated on its
/// own.
#[derive(Debug, Clone)]
pub struct Round {
    pub(crate) config: RoundConfig,
    pub(crate) available: BTreeSet<u8>,
    pub(crate) selected: BTreeSet<u8>,
    pub(crate) roll: Option<DiceRoll>,
    pub(crate) phase: RoundPhase,
    pub(crate) dead_roll: bool,
    pub(crate) skips_remaining: u8,
    pub(crate) roll_count: u32,
    pub(crate) tally: RoundTally,
    pub(crate) combos: Vec<Combo>,
    pub(crate) result: Option<GameResult>,
    pub(crate) logs: Vec<String>,
}

impl Default for Round {
    fn default() -> Self {
        Self::new(RoundConfig::default_config())
    }
}

impl Round {
    /// Fresh round with the full 1..12 board.
    #[must_use]
    pub fn new(config: RoundConfig) -> Self {
        Self {
            config,
            available: (BOARD_MIN..=BOARD_MAX).collect(),
            selected: BTreeSet::new(),
            roll: None,
            phase: RoundPhase::Idle,
            dead_roll: false,
            skips_remaining: config.skip_budget,
            roll_count: 0,
            tally: RoundTally::default(),
            combos: Vec::new(),
            result: None,
            logs: vec![String::from(LOG_NEW_ROUND)],
        }
    }

    #[must_use]
    pub const fn config(&self) -> RoundConfig {
        self.config
    }

    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub const fn available(&self) -> &BTreeSet<u8> {
        &self.available
    }

    #[must_use]
    pub const fn selected(&self) -> &BTreeSet<u8> {
        &self.selected
    }

    #[must_use]
    pub const fn roll(&self) -> Option<DiceRoll> {
        self.roll
    }

    /// Sum the current roll asks for, while one is live.
    #[must_use]
    pub fn target(&self) -> Option<u8> {
        self.roll.map(DiceRoll::target)
    }

    /// Derived combo list for the current (available, roll) pair.
    #[must_use]
    pub fn valid_combos(&self) -> &[Combo] {
        &self.combos
    }

    #[must_use]
    pub const fn skips_remaining(&self) -> u8 {
        self.skips_remaining
    }

    /// Accepted rolls so far; skips are not counted.
    #[must_use]
    pub const fn roll_count(&self) -> u32 {
        self.roll_count
    }

    /// Rolled with zero combos but a skip still in hand.
    #[must_use]
    pub const fn is_dead_roll(&self) -> bool {
        self.dead_roll
    }

    #[must_use]
    pub fn selected_sum(&self) -> u32 {
        self.selected.iter().map(|&n| u32::from(n)).sum()
    }

    /// Sum of tiles still on the board.
    #[must_use]
    pub fn leftover_sum(&self) -> u32 {
        self.available.iter().map(|&n| u32::from(n)).sum()
    }

    /// Diagnostic event keys, oldest first.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    // Action guards. An outer layer (animation lock, tap cooldown) composes
    // its own "permitted right now" check with these.

    #[must_use]
    pub fn can_roll(&self) -> bool {
        self.phase == RoundPhase::Idle
    }

    #[must_use]
    pub fn can_toggle(&self, tile: u8) -> bool {
        self.phase == RoundPhase::Rolled && !self.dead_roll && self.available.contains(&tile)
    }

    /// Whether confirm would succeed right now.
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        self.phase == RoundPhase::Rolled
            && !self.dead_roll
            && self
                .target()
                .is_some_and(|t| self.selected_sum() == u32::from(t))
            && is_exact_combo(&self.combos, &self.selected)
    }

    #[must_use]
    pub fn can_skip(&self) -> bool {
        self.phase == RoundPhase::Rolled && self.skips_remaining > 0
    }

    #[must_use]
    pub fn can_give_up(&self) -> bool {
        self.phase == RoundPhase::Stuck
    }

    /// Choose how many dice the next roll throws. Valid only while idle.
    pub fn set_dice_mode(&mut self, mode: DiceMode) -> bool {
        if self.phase != RoundPhase::Idle {
            return false;
        }
        self.config.dice_mode = mode;
        true
    }

    /// Accept a new roll. Valid only while idle; returns the roll on
    /// success. Clears the selection, increments the roll counter, and runs
    /// dead-roll detection on the fresh combo list.
    pub fn roll_dice(&mut self, source: &mut impl DiceSource) -> Option<DiceRoll> {
        if !self.can_roll() {
            log::debug!("roll rejected in phase {}", self.phase);
            return None;
        }
        let roll = DiceRoll::throw(self.config.dice_mode, source);
        self.selected.clear();
        self.roll = Some(roll);
        self.phase = RoundPhase::Rolled;
        self.dead_roll = false;
        self.roll_count += 1;
        self.push_log(LOG_ROLL);
        self.refresh_combos();
        Some(roll)
    }

    /// Add or remove a tile from the selection. A toggle that would break
    /// the selection rules is a silent no-op; returns whether the selection
    /// changed.
    pub fn toggle(&mut self, tile: u8) -> bool {
        if self.phase != RoundPhase::Rolled || self.dead_roll {
            return false;
        }
        let Some(roll) = self.roll else {
            return false;
        };
        if !self.available.contains(&tile) {
            return false;
        }
        if self.selected.remove(&tile) {
            return true;
        }
        // Growing the selection must keep sum <= target and leave it a
        // subset of at least one valid combo.
        if self.selected_sum() + u32::from(tile) > u32::from(roll.target()) {
            return false;
        }
        let mut next = self.selected.clone();
        next.insert(tile);
        if !is_partial_of_any(&self.combos, &next) {
            return false;
        }
        self.selected = next;
        true
    }

    /// Clear the selected tiles against the current roll.
    ///
    /// Succeeds only when the selection totals the target and equals one of
    /// the valid combinations exactly; the toggle rules should make other
    /// states unreachable, but both are re-checked here. On success the
    /// cleared tiles leave the board permanently and the round returns to
    /// idle, or to win when the board is empty.
    pub fn confirm(&mut self) -> ConfirmOutcome {
        if self.phase != RoundPhase::Rolled || self.dead_roll {
            log::debug!("confirm rejected in phase {}", self.phase);
            return ConfirmOutcome::NotApplicable;
        }
        let Some(roll) = self.roll else {
            return ConfirmOutcome::NotApplicable;
        };
        let target = u32::from(roll.target());
        let selected = self.selected_sum();
        if selected != target {
            return ConfirmOutcome::Rejected(ConfirmError::SumMismatch { selected, target });
        }
        if !is_exact_combo(&self.combos, &self.selected) {
            return ConfirmOutcome::Rejected(ConfirmError::NotACombo);
        }
        self.tally.record_confirm(self.selected.len());
        for tile in std::mem::take(&mut self.selected) {
            self.available.remove(&tile);
        }
        self.roll = None;
        self.combos.clear();
        self.push_log(LOG_CONFIRM);
        if self.available.is_empty() {
            self.phase = RoundPhase::Win;
            self.push_log(LOG_WIN);
            self.finish(Outcome::Win);
        } else {
            self.phase = RoundPhase::Idle;
        }
        ConfirmOutcome::Cleared(self.phase)
    }

    /// Spend a skip to discard the current roll and return to idle. Does
    /// not count as a roll. Returns false when no skip applies.
    pub fn skip(&mut self) -> bool {
        if !self.can_skip() {
            return false;
        }
        self.skips_remaining -= 1;
        self.selected.clear();
        self.roll = None;
        self.combos.clear();
        self.dead_roll = false;
        self.phase = RoundPhase::Idle;
        self.push_log(LOG_SKIP);
        true
    }

    /// Concede a stuck round. Returns false outside stuck.
    pub fn give_up(&mut self) -> bool {
        if !self.can_give_up() {
            return false;
        }
        self.phase = RoundPhase::GameOver;
        self.roll = None;
        self.combos.clear();
        self.push_log(LOG_GIVE_UP);
        self.finish(Outcome::Loss);
        true
    }

    /// Drain the terminal result. Yields `Some` exactly once per finished
    /// round.
    pub fn take_result(&mut self) -> Option<GameResult> {
        self.result.take()
    }

    /// Recompute the derived combo list and run dead-roll detection. Called
    /// whenever the available set or the roll changes while rolled.
    pub(crate) fn refresh_combos(&mut self) {
        self.combos = match (self.phase, self.roll) {
            (RoundPhase::Rolled, Some(roll)) => valid_combos(&self.available, roll.target()),
            _ => Vec::new(),
        };
        if self.phase == RoundPhase::Rolled && self.combos.is_empty() {
            if self.skips_remaining > 0 {
                self.dead_roll = true;
                self.push_log(LOG_DEAD_ROLL);
            } else {
                self.phase = RoundPhase::Stuck;
                self.push_log(LOG_STUCK);
            }
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        let skips_used = self.config.skip_budget.saturating_sub(self.skips_remaining);
        let leftover_sum = match outcome {
            Outcome::Win => None,
            Outcome::Loss => Some(self.leftover_sum()),
        };
        self.result = Some(GameResult {
            outcome,
            rolls_used: self.roll_count,
            leftover_sum,
            perfect: skips_used == 0,
            skips_used,
            three_plus_confirms: self.tally.three_plus_confirms,
            four_plus_confirms: self.tally.four_plus_confirms,
            max_combo_len: self.tally.max_combo_len,
        });
    }

    pub(crate) fn push_log(&mut self, key: &str) {
        self.logs.push(key.to_string());
    }
}
