//! DiceBox Game Engine
//!
//! Platform-agnostic core game logic for the DiceBox dice puzzle.
//! This crate provides the combination engine, the turn state machine, and
//! the stats/achievement/cosmetic collaborators without UI or
//! platform-specific dependencies.

pub mod achievements;
pub mod combos;
pub mod constants;
pub mod dice;
pub mod prefs;
pub mod progression;
pub mod result;
pub mod round;
pub mod snapshot;
pub mod stats;

// Re-export commonly used types
pub use achievements::{ACHIEVEMENTS, Achievement, AchievementId, EvalCtx};
pub use combos::{Combo, is_exact_combo, is_partial_of_any, valid_combos};
pub use dice::{DiceMode, DiceRoll, DiceSource, ScriptedDice, SeededDice};
pub use prefs::Prefs;
pub use progression::{
    CosmeticGrant, CosmeticSlot, CosmeticsState, ListenerHandle, Progression, ProgressionBus,
    UnlockRecord,
};
pub use result::{GameResult, Outcome, RoundTally};
pub use round::{ConfirmError, ConfirmOutcome, Round, RoundConfig, RoundPhase};
pub use snapshot::RoundSnapshot;
pub use stats::Stats;

/// Trait for abstracting persistence operations.
/// Platform-specific implementations should provide this.
///
/// Writes are fire-and-forget from the engine's perspective: the session
/// logs and swallows storage errors, and a failed read is treated the same
/// as a missing record. Implementations never gate a game transition.
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist the in-flight round snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save_round(&self, snapshot: &RoundSnapshot) -> Result<(), Self::Error>;

    /// Load the in-flight round snapshot, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read.
    fn load_round(&self) -> Result<Option<RoundSnapshot>, Self::Error>;

    /// Delete the in-flight round snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    fn clear_round(&self) -> Result<(), Self::Error>;

    /// Persist lifetime statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the stats cannot be written.
    fn save_stats(&self, stats: &Stats) -> Result<(), Self::Error>;

    /// Load lifetime statistics, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the stats cannot be read.
    fn load_stats(&self) -> Result<Option<Stats>, Self::Error>;

    /// Persist progression (achievements and cosmetics).
    ///
    /// # Errors
    ///
    /// Returns an error if the progression cannot be written.
    fn save_progression(&self, progression: &Progression) -> Result<(), Self::Error>;

    /// Load progression, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the progression cannot be read.
    fn load_progression(&self) -> Result<Option<Progression>, Self::Error>;

    /// Persist user preferences.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefs cannot be written.
    fn save_prefs(&self, prefs: &Prefs) -> Result<(), Self::Error>;

    /// Load user preferences, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefs cannot be read.
    fn load_prefs(&self) -> Result<Option<Prefs>, Self::Error>;
}

/// Report handed back after a terminal transition.
#[derive(Debug, Clone)]
pub struct TerminalReport {
    pub result: GameResult,
    /// Stats after this round was folded in.
    pub stats: Stats,
    pub newly_unlocked: Vec<AchievementId>,
}

/// Orchestrates rounds against the persistence and progression
/// collaborators. Owns all round state for the life of the process.
///
/// Every action applies its state transition synchronously and then issues
/// the persistence write; a failed write leaves the in-memory state
/// authoritative and is only logged.
pub struct GameSession<D, S>
where
    D: DiceSource,
    S: GameStorage,
{
    dice: D,
    storage: S,
    config: RoundConfig,
    round: Round,
    stats: Stats,
    progression: Progression,
    prefs: Prefs,
    bus: ProgressionBus,
    report: Option<TerminalReport>,
    clock: Option<fn() -> String>,
}

impl<D, S> GameSession<D, S>
where
    D: DiceSource,
    S: GameStorage,
{
    /// Create a session with a fresh round, loading persisted aggregates.
    /// Storage failures degrade to defaults.
    pub fn new(config: RoundConfig, dice: D, storage: S) -> Self {
        let stats = load_or_default(storage.load_stats(), "stats");
        let progression = load_or_default(storage.load_progression(), "progression");
        let prefs = load_or_default(storage.load_prefs(), "prefs");
        Self {
            dice,
            storage,
            config,
            round: Round::new(config),
            stats,
            progression,
            prefs,
            bus: ProgressionBus::new(),
            report: None,
            clock: None,
        }
    }

    /// Provide a timestamp source for achievement unlock records. Without
    /// one, unlocks are stored undated.
    pub fn set_clock(&mut self, clock: fn() -> String) {
        self.clock = Some(clock);
    }

    /// Restore an in-flight round from the snapshot store. Missing or
    /// rejected snapshots leave the fresh round in place; a rejected
    /// snapshot is also cleared so it cannot resurface.
    pub fn resume(&mut self) -> bool {
        let snapshot = match self.storage.load_round() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return false,
            Err(err) => {
                log::warn!("failed to load round snapshot, starting fresh: {err}");
                return false;
            }
        };
        match Round::restore(&snapshot) {
            Some(round) => {
                self.config = round.config();
                self.round = round;
                true
            }
            None => {
                log::warn!("round snapshot rejected, starting fresh");
                self.clear_round_snapshot();
                false
            }
        }
    }

    #[must_use]
    pub const fn round(&self) -> &Round {
        &self.round
    }

    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    #[must_use]
    pub const fn progression(&self) -> &Progression {
        &self.progression
    }

    #[must_use]
    pub const fn prefs(&self) -> &Prefs {
        &self.prefs
    }

    /// Notification channel collaborators subscribe to.
    #[must_use]
    pub const fn bus(&self) -> &ProgressionBus {
        &self.bus
    }

    /// Roll the dice. Persists the round on success.
    pub fn roll(&mut self) -> Option<DiceRoll> {
        let rolled = self.round.roll_dice(&mut self.dice);
        if rolled.is_some() {
            self.persist_round();
        }
        rolled
    }

    /// Toggle a tile. Persists the round when the selection changed.
    pub fn toggle(&mut self, tile: u8) -> bool {
        let changed = self.round.toggle(tile);
        if changed {
            self.persist_round();
        }
        changed
    }

    /// Confirm the selection. On a clear, persists the round, or runs the
    /// terminal handoff when the board emptied.
    pub fn confirm(&mut self) -> ConfirmOutcome {
        let outcome = self.round.confirm();
        if outcome.cleared() {
            self.after_transition();
        }
        outcome
    }

    /// Spend a skip. Persists the round on success.
    pub fn skip(&mut self) -> bool {
        let skipped = self.round.skip();
        if skipped {
            self.persist_round();
        }
        skipped
    }

    /// Concede a stuck round, triggering the terminal handoff.
    pub fn give_up(&mut self) -> bool {
        let conceded = self.round.give_up();
        if conceded {
            self.after_transition();
        }
        conceded
    }

    /// Drain the report produced by the action that ended the round.
    pub fn take_report(&mut self) -> Option<TerminalReport> {
        self.report.take()
    }

    /// Discard the current round and start fresh with the session config.
    pub fn play_again(&mut self) {
        self.round = Round::new(self.config);
        self.report = None;
        self.clear_round_snapshot();
    }

    /// Choose the dice count. Future rounds always pick it up; the current
    /// round only while idle. Returns whether the current round applied it.
    pub fn set_dice_mode(&mut self, mode: DiceMode) -> bool {
        self.config.dice_mode = mode;
        let applied = self.round.set_dice_mode(mode);
        if applied {
            self.persist_round();
        }
        applied
    }

    /// Mutate preferences and persist them, keeping the in-memory copy
    /// authoritative on write failure.
    pub fn update_prefs(&mut self, apply: impl FnOnce(&mut Prefs)) -> Prefs {
        apply(&mut self.prefs);
        if let Err(err) = self.storage.save_prefs(&self.prefs) {
            log::warn!("failed to persist prefs: {err}");
        }
        self.prefs
    }

    /// Equip or clear a cosmetic, persisting and notifying on change.
    pub fn equip_cosmetic(&mut self, slot: CosmeticSlot, id: Option<&str>) -> bool {
        let changed = self.progression.equip_cosmetic(slot, id);
        if changed {
            self.persist_progression();
            self.bus.publish();
        }
        changed
    }

    fn after_transition(&mut self) {
        if self.round.phase().is_terminal() {
            if let Some(result) = self.round.take_result() {
                let report = self.handoff(result);
                self.report = Some(report);
            }
        } else {
            self.persist_round();
        }
    }

    /// Terminal handoff, exactly once per round: stats, achievements,
    /// cosmetic rewards, notification, snapshot cleanup.
    fn handoff(&mut self, result: GameResult) -> TerminalReport {
        self.stats.record_game(&result);
        if let Err(err) = self.storage.save_stats(&self.stats) {
            log::warn!("failed to persist stats: {err}");
        }

        let owned = self.progression.owned_achievements();
        let newly_unlocked = achievements::evaluate(&result, &self.stats, &owned);
        if !newly_unlocked.is_empty() {
            let date = self.clock.map(|clock| clock());
            self.progression
                .award_achievements(&newly_unlocked, date.as_deref());
            let rewards = achievements::rewards_for(&newly_unlocked);
            self.progression.unlock_cosmetics(&rewards);
            self.persist_progression();
            self.bus.publish();
        }

        self.clear_round_snapshot();
        TerminalReport {
            result,
            stats: self.stats.clone(),
            newly_unlocked,
        }
    }

    fn persist_round(&self) {
        if let Err(err) = self.storage.save_round(&self.round.snapshot()) {
            log::warn!("failed to persist round snapshot: {err}");
        }
    }

    fn persist_progression(&self) {
        if let Err(err) = self.storage.save_progression(&self.progression) {
            log::warn!("failed to persist progression: {err}");
        }
    }

    fn clear_round_snapshot(&self) {
        if let Err(err) = self.storage.clear_round() {
            log::warn!("failed to clear round snapshot: {err}");
        }
    }
}

fn load_or_default<T, E>(loaded: Result<Option<T>, E>, what: &str) -> T
where
    T: Default,
    E: std::error::Error,
{
    match loaded {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(err) => {
            log::warn!("failed to load {what}, using defaults: {err}");
            T::default()
        }
    }
}
