use std::collections::{BTreeMap, BTreeSet};

use tabvar_core::{Category, RngHandle, VariantError};

use super::SelectionPolicy;
use crate::decision::{FileCells, SelectionDecision};

const MAX_WEIGHT: f64 = 10.0;

/// Ranks categories by ascending perturbed-cell count and keeps a
/// proportional prefix of each: rarer categories keep more.
///
/// No random draw is involved; the kept coordinates are the first
/// `round(weight / 10 * count)` in row-major order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankWeighted;

/// Maps per-category counts to weights in `1..=10`, or 0 for empty categories.
///
/// Only categories with perturbed cells are ranked; the rest weigh 0.
/// Equal counts share a dense rank. Rank `r` out of `max` maps to
/// `round((max - r) / max * 9 + 1)`, ties to even; a single distinct count
/// maps every ranked category to 10.
pub fn rank_weights(counts: &BTreeMap<Category, usize>) -> BTreeMap<Category, u8> {
    let distinct: BTreeSet<usize> = counts
        .values()
        .copied()
        .filter(|count| *count > 0)
        .collect();
    let ranks: BTreeMap<usize, usize> = distinct
        .into_iter()
        .enumerate()
        .map(|(rank, count)| (count, rank))
        .collect();
    let max_rank = ranks.len().saturating_sub(1);
    counts
        .iter()
        .map(|(category, count)| {
            let weight = if *count == 0 {
                0.0
            } else if max_rank == 0 {
                MAX_WEIGHT
            } else {
                let rank = ranks.get(count).copied().unwrap_or(0);
                ((max_rank - rank) as f64 / max_rank as f64 * (MAX_WEIGHT - 1.0) + 1.0)
                    .round_ties_even()
            };
            (category.clone(), weight as u8)
        })
        .collect()
}

impl SelectionPolicy for RankWeighted {
    fn name(&self) -> &'static str {
        "rank-weighted"
    }

    fn select(
        &self,
        cells: &FileCells,
        _target: usize,
        _rng: &mut RngHandle,
    ) -> Result<SelectionDecision, VariantError> {
        let counts: BTreeMap<Category, usize> = cells
            .iter()
            .map(|(category, set)| (category.clone(), set.len()))
            .collect();
        let weights = rank_weights(&counts);
        let mut decision = SelectionDecision::for_categories(cells);
        for (category, set) in cells {
            let weight = weights.get(category).copied().unwrap_or(0);
            let keep = (f64::from(weight) / MAX_WEIGHT * set.len() as f64).round_ties_even() as usize;
            for coord in set.iter().take(keep.min(set.len())) {
                decision.keep(category, *coord);
            }
        }
        Ok(decision)
    }
}
