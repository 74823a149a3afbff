//! Dice primitives and the randomness seam.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::DIE_FACES;

/// Source of individual die rolls. The engine calls it once per die needed.
pub trait DiceSource {
    /// Uniformly distributed integer in 1..=6.
    fn roll_die(&mut self) -> u8;
}

/// Deterministic dice stream, seeded once per session.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl DiceSource for SeededDice {
    fn roll_die(&mut self) -> u8 {
        self.rng.gen_range(1..=DIE_FACES)
    }
}

/// Scripted source for deterministic tests and QA scenarios.
///
/// Yields the queued faces in order; intended for harness use only, and
/// panics when the script runs dry rather than inventing a roll.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
}

impl ScriptedDice {
    #[must_use]
    pub fn new(faces: &[u8]) -> Self {
        Self {
            faces: faces.iter().copied().collect(),
        }
    }

    /// Queue another face at the end of the script.
    pub fn push(&mut self, face: u8) {
        self.faces.push_back(face);
    }

    /// Faces left in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for ScriptedDice {
    fn roll_die(&mut self) -> u8 {
        self.faces.pop_front().expect("scripted dice exhausted")
    }
}

/// Number of dice thrown per roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiceMode {
    One,
    #[default]
    Two,
}

impl DiceMode {
    #[must_use]
    pub const fn dice_count(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

/// One accepted roll: one or two die faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub first: u8,
    pub second: Option<u8>,
}

impl DiceRoll {
    /// Throw according to `mode`, one source call per die.
    #[must_use]
    pub fn throw(mode: DiceMode, source: &mut impl DiceSource) -> Self {
        let first = source.roll_die();
        let second = match mode {
            DiceMode::One => None,
            DiceMode::Two => Some(source.roll_die()),
        };
        Self { first, second }
    }

    /// The sum the player must clear.
    #[must_use]
    pub fn target(self) -> u8 {
        self.first + self.second.unwrap_or(0)
    }
}
