use dicebox_game::{
    ConfirmError, ConfirmOutcome, Outcome, Round, RoundConfig, RoundPhase, RoundSnapshot,
    ScriptedDice,
};

/// Dice script that clears the full board in eleven rolls:
/// 12, 11, 10, 9, 8, 7 as single-tile clears, then 6, 5, 4, 3, and a final
/// 3 cleared as {1,2}.
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

fn play_full_clear(round: &mut Round, dice: &mut ScriptedDice) {
    for selection in FULL_CLEAR_SELECTIONS {
        round.roll_dice(dice).expect("roll accepted");
        for &tile in *selection {
            assert!(round.toggle(tile), "toggle {tile} accepted");
        }
        assert!(round.confirm().cleared(), "confirm accepted");
    }
}

fn restored(raw: &str) -> Round {
    let snapshot = RoundSnapshot::from_json(raw).expect("snapshot parses");
    Round::restore(&snapshot).expect("snapshot restores")
}

#[test]
fn full_clear_reaches_win_exactly_once() {
    let mut round = Round::new(RoundConfig::default_config());
    let mut dice = ScriptedDice::new(FULL_CLEAR);

    play_full_clear(&mut round, &mut dice);

    assert_eq!(round.phase(), RoundPhase::Win);
    assert!(round.available().is_empty());
    assert_eq!(dice.remaining(), 0);

    let result = round.take_result().expect("terminal result");
    assert_eq!(result.outcome, Outcome::Win);
    assert_eq!(result.rolls_used, 11);
    assert_eq!(result.leftover_sum, None);
    assert!(result.perfect, "no skips were spent");
    assert_eq!(result.skips_used, 0);
    assert_eq!(result.max_combo_len, 2);
    assert!(round.take_result().is_none(), "result drains exactly once");

    // Terminal phase refuses further play.
    let mut extra = ScriptedDice::new(&[1, 1]);
    assert!(round.roll_dice(&mut extra).is_none());
    assert!(!round.toggle(1));
    assert_eq!(round.confirm(), ConfirmOutcome::NotApplicable);
}

#[test]
fn win_after_a_skip_is_not_perfect() {
    let mut round = Round::new(RoundConfig::default_config());
    let mut dice = ScriptedDice::new(&[6, 6]);
    round.roll_dice(&mut dice).expect("roll accepted");
    assert!(round.skip());

    let mut dice = ScriptedDice::new(FULL_CLEAR);
    play_full_clear(&mut round, &mut dice);

    let result = round.take_result().expect("terminal result");
    assert_eq!(result.outcome, Outcome::Win);
    assert_eq!(result.rolls_used, 12, "the skipped roll still counted");
    assert!(!result.perfect);
    assert_eq!(result.skips_used, 1);
}

#[test]
fn dead_roll_permits_only_skip() {
    let mut round = restored(r#"{"available":[8,9,10,11,12],"phase":"idle","skips_remaining":2,"skip_budget":5,"roll_count":6}"#);
    let mut dice = ScriptedDice::new(&[1, 2]);
    round.roll_dice(&mut dice).expect("roll accepted");

    assert_eq!(round.phase(), RoundPhase::Rolled);
    assert!(round.is_dead_roll());
    assert!(round.valid_combos().is_empty());

    // Only skip is allowed; nothing else moves.
    assert!(!round.toggle(8));
    assert_eq!(round.confirm(), ConfirmOutcome::NotApplicable);
    assert!(round.can_skip());
    assert!(round.skip());

    assert_eq!(round.phase(), RoundPhase::Idle);
    assert!(!round.is_dead_roll());
    assert_eq!(round.skips_remaining(), 1);
    assert!(round.roll().is_none(), "skip discards, never rerolls");
}

#[test]
fn exhausted_skips_lead_through_stuck_to_gameover() {
    let mut round = restored(r#"{"available":[8,9,10,11,12],"phase":"idle","skips_remaining":1,"skip_budget":5,"roll_count":6}"#);

    let mut dice = ScriptedDice::new(&[1, 1]);
    round.roll_dice(&mut dice).expect("roll accepted");
    assert!(round.is_dead_roll());
    assert!(round.skip());

    let mut dice = ScriptedDice::new(&[1, 2]);
    round.roll_dice(&mut dice).expect("roll accepted");
    assert_eq!(round.phase(), RoundPhase::Stuck);
    assert!(!round.can_skip());
    assert!(!round.skip());
    assert!(round.can_give_up());

    assert!(round.give_up());
    assert_eq!(round.phase(), RoundPhase::GameOver);

    let result = round.take_result().expect("terminal result");
    assert_eq!(result.outcome, Outcome::Loss);
    assert_eq!(result.leftover_sum, Some(50));
    assert_eq!(result.skips_used, 5, "budget was fully spent");
    assert!(!result.perfect);
}

#[test]
fn proper_subset_of_a_combo_cannot_confirm() {
    let mut round = Round::new(RoundConfig::default_config());
    let mut dice = ScriptedDice::new(&[6, 6]);
    round.roll_dice(&mut dice).expect("roll accepted");

    // Target 12: {1,2,4} is a proper subset of {1,2,4,5} but no combo itself.
    for tile in [1, 2, 4] {
        assert!(round.toggle(tile));
    }
    assert_eq!(
        round.confirm(),
        ConfirmOutcome::Rejected(ConfirmError::SumMismatch {
            selected: 7,
            target: 12
        })
    );
    // The rejection mutated nothing.
    assert_eq!(round.phase(), RoundPhase::Rolled);
    assert_eq!(round.selected_sum(), 7);
    assert_eq!(round.available().len(), 12);

    assert!(round.toggle(5));
    assert!(round.confirm().cleared());
    assert_eq!(round.available().len(), 8);
}

#[test]
fn selection_clears_on_new_roll() {
    let mut round = Round::new(RoundConfig::default_config());
    let mut dice = ScriptedDice::new(&[3, 4, 2, 3]);
    round.roll_dice(&mut dice).expect("roll accepted");
    assert!(round.toggle(7));
    assert!(round.skip());
    round.roll_dice(&mut dice).expect("roll accepted");
    assert!(round.selected().is_empty());
    assert_eq!(round.target(), Some(5));
}

#[test]
fn guided_toggle_blocks_unreachable_partials() {
    let mut round = Round::new(RoundConfig::default_config());
    let mut dice = ScriptedDice::new(&[2, 3]);
    round.roll_dice(&mut dice).expect("roll accepted");

    // Target 5: combos {5}, {1,4}, {2,3}.
    assert!(round.toggle(5));
    // {5,1} exceeds the target outright.
    assert!(!round.toggle(1));
    assert!(round.toggle(5), "untoggle always allowed");
    assert!(round.toggle(1));
    // {1,2} fits the sum but is a subset of no combo.
    assert!(!round.toggle(2));
    assert!(round.toggle(4));
    assert!(round.confirm().cleared());
}
