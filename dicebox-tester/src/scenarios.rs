//! Pure-logic QA scenarios against the DiceBox engine.

use anyhow::{Context, Result, ensure};
use dicebox_game::{
    AchievementId, ConfirmOutcome, GameSession, Outcome, Round, RoundConfig, RoundPhase,
    RoundSnapshot, ScriptedDice, SeededDice,
};

use crate::auto;
use crate::storage::MemoryStorage;

/// Dice script that clears the full board in eleven rolls.
const FULL_CLEAR: &[u8] = &[
    6, 6, 5, 6, 4, 6, 3, 6, 2, 6, 1, 6, 3, 3, 2, 3, 2, 2, 1, 2, 1, 2,
];

const FULL_CLEAR_SELECTIONS: &[&[u8]] = &[
    &[12],
    &[11],
    &[10],
    &[9],
    &[8],
    &[7],
    &[6],
    &[5],
    &[4],
    &[3],
    &[1, 2],
];

pub struct TestScenario {
    pub name: &'static str,
    pub description: &'static str,
    /// Runs one iteration against the given seed.
    pub test_fn: fn(u64) -> Result<()>,
}

#[must_use]
pub fn get_all_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario {
            name: "smoke",
            description: "Scripted full clear: every transition lands where it should",
            test_fn: run_smoke,
        },
        TestScenario {
            name: "dead-roll",
            description: "Unmatchable roll with skips left only permits a skip",
            test_fn: run_dead_roll,
        },
        TestScenario {
            name: "stuck",
            description: "Unmatchable roll without skips runs stuck -> gameover",
            test_fn: run_stuck,
        },
        TestScenario {
            name: "full-game",
            description: "Seeded auto-play terminates with a coherent result",
            test_fn: run_full_game,
        },
        TestScenario {
            name: "session",
            description: "Session wiring: stats, achievements, snapshot cleanup",
            test_fn: run_session,
        },
        TestScenario {
            name: "resume",
            description: "Mid-roll snapshot survives a simulated restart",
            test_fn: run_resume,
        },
    ]
}

#[must_use]
pub fn get_scenarios_by_names(names: &[String]) -> Vec<TestScenario> {
    get_all_scenarios()
        .into_iter()
        .filter(|scenario| names.iter().any(|name| name == scenario.name))
        .collect()
}

fn restored_round(raw: &str) -> Result<Round> {
    let snapshot = RoundSnapshot::from_json(raw).context("snapshot should parse")?;
    Round::restore(&snapshot).context("snapshot should restore")
}

fn run_smoke(_seed: u64) -> Result<()> {
    let mut round = Round::new(RoundConfig::default_config());
    let mut dice = ScriptedDice::new(FULL_CLEAR);
    ensure!(round.phase() == RoundPhase::Idle, "fresh round starts idle");

    for selection in FULL_CLEAR_SELECTIONS {
        let roll = round
            .roll_dice(&mut dice)
            .context("idle round accepts a roll")?;
        ensure!(
            !round.valid_combos().is_empty(),
            "target {} has combos",
            roll.target()
        );
        for &tile in *selection {
            ensure!(round.toggle(tile), "toggle {tile} accepted");
        }
        ensure!(
            matches!(round.confirm(), ConfirmOutcome::Cleared(_)),
            "confirm accepted"
        );
    }

    ensure!(round.phase() == RoundPhase::Win, "board cleared means win");
    let result = round.take_result().context("terminal round has a result")?;
    ensure!(result.outcome == Outcome::Win, "outcome is a win");
    ensure!(result.rolls_used == 11, "eleven rolls were accepted");
    ensure!(result.perfect, "no skips makes it perfect");
    ensure!(round.take_result().is_none(), "result drains exactly once");
    Ok(())
}

fn run_dead_roll(_seed: u64) -> Result<()> {
    let mut round = restored_round(
        r#"{"available":[8,9,10,11,12],"phase":"idle","skips_remaining":2,"skip_budget":5,"roll_count":6}"#,
    )?;
    let mut dice = ScriptedDice::new(&[1, 2]);
    round.roll_dice(&mut dice).context("roll accepted")?;

    ensure!(round.is_dead_roll(), "no combos and skips left is dead roll");
    ensure!(round.phase() == RoundPhase::Rolled, "dead roll stays rolled");
    ensure!(!round.toggle(8), "toggle blocked during dead roll");
    ensure!(
        round.confirm() == ConfirmOutcome::NotApplicable,
        "confirm blocked during dead roll"
    );
    ensure!(round.skip(), "skip is the one legal action");
    ensure!(round.phase() == RoundPhase::Idle, "skip returns to idle");
    ensure!(round.skips_remaining() == 1, "skip budget decremented");
    ensure!(round.roll().is_none(), "skip discards without rerolling");
    Ok(())
}

fn run_stuck(_seed: u64) -> Result<()> {
    let mut round = restored_round(
        r#"{"available":[8,9,10,11,12],"phase":"idle","skips_remaining":0,"skip_budget":5,"roll_count":6}"#,
    )?;
    let mut dice = ScriptedDice::new(&[1, 2]);
    round.roll_dice(&mut dice).context("roll accepted")?;

    ensure!(round.phase() == RoundPhase::Stuck, "no combos, no skips");
    ensure!(!round.skip(), "skip refused while stuck");
    ensure!(round.give_up(), "give up accepted from stuck");
    ensure!(round.phase() == RoundPhase::GameOver, "gameover is terminal");

    let result = round.take_result().context("terminal round has a result")?;
    ensure!(result.outcome == Outcome::Loss, "conceding is a loss");
    ensure!(
        result.leftover_sum == Some(50),
        "leftover sums the remaining tiles"
    );
    Ok(())
}

fn run_full_game(seed: u64) -> Result<()> {
    let mut round = Round::new(RoundConfig::default_config());
    let mut dice = SeededDice::new(seed);
    let result = auto::play_round(&mut round, &mut dice)?;

    ensure!(result.rolls_used >= 1, "at least one roll was accepted");
    match result.outcome {
        Outcome::Win => {
            ensure!(round.available().is_empty(), "win leaves no tiles");
            ensure!(result.leftover_sum.is_none(), "win has no leftover");
        }
        Outcome::Loss => {
            let leftover = result.leftover_sum.context("loss carries leftover")?;
            ensure!(leftover > 0, "loss keeps at least one tile");
            ensure!(leftover == round.leftover_sum(), "leftover matches board");
        }
    }
    ensure!(
        result.perfect == (result.skips_used == 0),
        "perfect tracks skip usage"
    );
    Ok(())
}

fn run_session(_seed: u64) -> Result<()> {
    let storage = MemoryStorage::default();
    let dice = ScriptedDice::new(FULL_CLEAR);
    let mut session = GameSession::new(RoundConfig::default_config(), dice, storage.clone());

    for selection in FULL_CLEAR_SELECTIONS {
        session.roll().context("roll accepted")?;
        for &tile in *selection {
            ensure!(session.toggle(tile), "toggle {tile} accepted");
        }
        ensure!(
            matches!(session.confirm(), ConfirmOutcome::Cleared(_)),
            "confirm accepted"
        );
    }

    let report = session.take_report().context("report after win")?;
    ensure!(report.stats.games_played == 1, "stats recorded once");
    ensure!(
        report.newly_unlocked.contains(&AchievementId::FirstWin),
        "first win unlocks"
    );
    ensure!(
        report.newly_unlocked.contains(&AchievementId::PerfectShut),
        "perfect shut unlocks"
    );
    ensure!(
        session.take_report().is_none(),
        "report drains exactly once"
    );
    ensure!(!storage.has_round(), "terminal round clears its snapshot");
    Ok(())
}

fn run_resume(_seed: u64) -> Result<()> {
    let storage = MemoryStorage::default();
    {
        let dice = ScriptedDice::new(&[3, 4]);
        let mut session = GameSession::new(RoundConfig::default_config(), dice, storage.clone());
        session.roll().context("roll accepted")?;
        ensure!(session.toggle(3), "toggle 3 accepted");
        ensure!(session.toggle(4), "toggle 4 accepted");
    }
    ensure!(storage.has_round(), "mid-roll snapshot persisted");

    let dice = ScriptedDice::new(&[]);
    let mut session = GameSession::new(RoundConfig::default_config(), dice, storage);
    ensure!(session.resume(), "snapshot resumes");
    ensure!(
        session.round().phase() == RoundPhase::Rolled,
        "resumed mid-roll"
    );
    ensure!(
        session.round().selected_sum() == 7,
        "selection restored as a set"
    );
    ensure!(
        matches!(session.confirm(), ConfirmOutcome::Cleared(_)),
        "resumed selection confirms"
    );
    Ok(())
}
