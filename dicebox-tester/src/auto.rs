//! Greedy auto-player used by QA scenarios and playability sweeps.

use anyhow::{Result, bail};
use dicebox_game::{Combo, DiceSource, GameResult, Round, RoundPhase};

// Generous bound: a round can see at most 12 confirms plus the skip budget
// in rolls, so anything near this is a state-machine bug.
const MAX_STEPS: u32 = 200;

/// Combo choice for the bot: longest combo first, then the one holding the
/// biggest tiles. Clearing many tiles keeps later low rolls playable.
fn pick_combo(combos: &[Combo]) -> Option<Combo> {
    combos.iter().cloned().max_by(|a, b| {
        a.len().cmp(&b.len()).then_with(|| {
            let high_a: Vec<u8> = a.iter().rev().copied().collect();
            let high_b: Vec<u8> = b.iter().rev().copied().collect();
            high_a.cmp(&high_b)
        })
    })
}

/// Play one round to its terminal phase: confirm greedily, skip dead rolls,
/// concede when stuck.
pub fn play_round(round: &mut Round, dice: &mut impl DiceSource) -> Result<GameResult> {
    for _ in 0..MAX_STEPS {
        match round.phase() {
            RoundPhase::Idle => {
                if round.roll_dice(dice).is_none() {
                    bail!("idle round refused a roll");
                }
            }
            RoundPhase::Rolled => {
                if round.is_dead_roll() {
                    if !round.skip() {
                        bail!("dead roll refused the only legal action");
                    }
                    continue;
                }
                let Some(combo) = pick_combo(round.valid_combos()) else {
                    bail!("rolled phase with no combos and no dead-roll flag");
                };
                for tile in &combo {
                    if !round.toggle(*tile) {
                        bail!("toggle {tile} rejected while building {combo:?}");
                    }
                }
                if !round.confirm().cleared() {
                    bail!("confirm rejected for derived combo {combo:?}");
                }
            }
            RoundPhase::Stuck => {
                if !round.give_up() {
                    bail!("stuck round refused to concede");
                }
            }
            RoundPhase::Win | RoundPhase::GameOver => {
                return round
                    .take_result()
                    .ok_or_else(|| anyhow::anyhow!("terminal round had no result"));
            }
        }
    }
    bail!("round did not terminate within {MAX_STEPS} steps")
}
