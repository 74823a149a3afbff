//! Combination enumeration for the tile board.
//!
//! Pure subset search: every distinct subset of the available tiles that
//! sums exactly to the roll target, each produced once in canonical
//! ascending order. The turn state machine derives everything it validates
//! from this list.

use smallvec::SmallVec;
use std::collections::BTreeSet;

/// A single summing combination, tiles in ascending order.
///
/// On a 1..12 board with targets capped at 12 a combo never holds more than
/// four tiles (1+2+3+4 already sums to 10), so the inline capacity keeps
/// play allocation-free.
pub type Combo = SmallVec<[u8; 4]>;

/// Enumerate every subset of `available` summing exactly to `target`.
///
/// Candidates are visited in ascending order with a start-index cursor, so
/// each subset is generated exactly once and arrives pre-sorted. A branch is
/// cut as soon as a candidate exceeds the remaining sum; every later
/// candidate is larger, so the cut loses nothing.
///
/// An empty result is a normal outcome, not an error. The search space is
/// finite and the remaining target strictly decreases, so this always
/// terminates; with at most twelve tiles the exponential worst case stays
/// trivial.
#[must_use]
pub fn valid_combos(available: &BTreeSet<u8>, target: u8) -> Vec<Combo> {
    let nums: Vec<u8> = available.iter().copied().collect();
    let mut out = Vec::new();
    let mut path = Combo::new();
    backtrack(&nums, 0, target, &mut path, &mut out);
    out
}

fn backtrack(nums: &[u8], start: usize, remain: u8, path: &mut Combo, out: &mut Vec<Combo>) {
    if remain == 0 {
        // Empty path only happens for a top-level target of zero, which the
        // turn machine never produces; a combo is always non-empty.
        if !path.is_empty() {
            out.push(path.clone());
        }
        return;
    }
    for (offset, &n) in nums[start..].iter().enumerate() {
        if n > remain {
            break;
        }
        path.push(n);
        backtrack(nums, start + offset + 1, remain - n, path, out);
        path.pop();
    }
}

/// True when `selection` is a subset of at least one combo.
///
/// This is the guided-selection rule: a partial selection stays legal only
/// while it can still grow into some valid combination.
#[must_use]
pub fn is_partial_of_any(combos: &[Combo], selection: &BTreeSet<u8>) -> bool {
    combos
        .iter()
        .any(|combo| selection.iter().all(|n| combo.contains(n)))
}

/// True when `selection` equals some combo as a set.
#[must_use]
pub fn is_exact_combo(combos: &[Combo], selection: &BTreeSet<u8>) -> bool {
    combos
        .iter()
        .any(|combo| combo.len() == selection.len() && combo.iter().all(|n| selection.contains(n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tiles: &[u8]) -> BTreeSet<u8> {
        tiles.iter().copied().collect()
    }

    fn has_combo(combos: &[Combo], tiles: &[u8]) -> bool {
        is_exact_combo(combos, &set(tiles))
    }

    #[test]
    fn basic_seven_with_full_board() {
        let combos = valid_combos(&set(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]), 7);
        for combo in &combos {
            let sum: u32 = combo.iter().map(|&n| u32::from(n)).sum();
            assert_eq!(sum, 7);
        }
        assert!(has_combo(&combos, &[7]));
        assert!(has_combo(&combos, &[1, 6]));
        assert!(has_combo(&combos, &[2, 5]));
        assert!(has_combo(&combos, &[3, 4]));
    }

    #[test]
    fn respects_unavailable_tiles() {
        // 3 and 7 missing, so [7] and [3,4] are impossible.
        let combos = valid_combos(&set(&[1, 2, 4, 5, 6, 8, 9, 10, 11, 12]), 7);
        assert!(!has_combo(&combos, &[7]));
        assert!(!has_combo(&combos, &[3, 4]));
        assert!(has_combo(&combos, &[1, 6]));
        assert!(has_combo(&combos, &[2, 5]));
    }

    #[test]
    fn unique_valid_subsets_only() {
        let combos = valid_combos(&set(&[1, 2, 3, 4]), 5);
        assert_eq!(combos.len(), 2);
        assert!(has_combo(&combos, &[1, 4]));
        assert!(has_combo(&combos, &[2, 3]));
    }

    #[test]
    fn no_combos_is_empty_not_error() {
        let combos = valid_combos(&set(&[8, 9, 10, 11, 12]), 3);
        assert!(combos.is_empty());
    }

    #[test]
    fn target_twelve_spot_checks() {
        let combos = valid_combos(&set(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]), 12);
        assert!(has_combo(&combos, &[12]));
        assert!(has_combo(&combos, &[5, 7]));
        assert!(has_combo(&combos, &[1, 4, 7]));
        assert!(has_combo(&combos, &[2, 3, 7]));
        assert!(has_combo(&combos, &[3, 4, 5]));
    }

    #[test]
    fn combos_arrive_sorted_and_distinct() {
        let combos = valid_combos(&set(&[1, 2, 3, 4, 5, 6]), 6);
        for combo in &combos {
            assert!(combo.windows(2).all(|w| w[0] < w[1]));
        }
        let as_sets: BTreeSet<Vec<u8>> = combos.iter().map(|c| c.to_vec()).collect();
        assert_eq!(as_sets.len(), combos.len());
    }

    #[test]
    fn target_zero_yields_nothing() {
        let combos = valid_combos(&set(&[1, 2, 3]), 0);
        assert!(combos.is_empty());
    }

    #[test]
    fn target_above_total_yields_nothing() {
        let combos = valid_combos(&set(&[1, 2, 3]), 7);
        assert!(combos.is_empty());
    }

    #[test]
    fn partial_and_exact_helpers() {
        let combos = valid_combos(&set(&[1, 2, 3, 4, 5, 6, 7]), 7);
        assert!(is_partial_of_any(&combos, &set(&[1])));
        assert!(is_partial_of_any(&combos, &set(&[3, 4])));
        assert!(!is_partial_of_any(&combos, &set(&[1, 2, 3])));
        assert!(is_exact_combo(&combos, &set(&[3, 4])));
        assert!(!is_exact_combo(&combos, &set(&[3])));
        // Empty selection is trivially a partial of anything but never exact.
        assert!(is_partial_of_any(&combos, &set(&[])));
        assert!(!is_exact_combo(&combos, &set(&[])));
    }
}
