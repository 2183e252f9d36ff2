use rand::Rng;
use tabvar_core::{Category, CellCoord, RngHandle, VariantError};
use tracing::debug;

use super::SelectionPolicy;
use crate::decision::{FileCells, SelectionDecision};
use crate::groups::{GroupWeights, PerformanceGroup, PerformanceGroups};

/// Draws a performance group by a biased coin, then a coordinate uniformly
/// from the group's remaining cells, until the file target is met.
///
/// Group weights come from corpus statistics (see
/// [`GroupWeights::from_corpus`]). Categories outside every group take part
/// in the output but never keep cells.
#[derive(Debug, Clone)]
pub struct GroupWeightedStratified {
    groups: PerformanceGroups,
    weights: GroupWeights,
}

impl GroupWeightedStratified {
    /// Creates the policy from a group assignment and precomputed weights.
    pub fn new(groups: PerformanceGroups, weights: GroupWeights) -> Self {
        Self { groups, weights }
    }

    /// Weights used for the group draw.
    pub fn weights(&self) -> &GroupWeights {
        &self.weights
    }
}

impl SelectionPolicy for GroupWeightedStratified {
    fn name(&self) -> &'static str {
        "group-weighted-stratified"
    }

    fn uses_target(&self) -> bool {
        true
    }

    fn select(
        &self,
        cells: &FileCells,
        target: usize,
        rng: &mut RngHandle,
    ) -> Result<SelectionDecision, VariantError> {
        let mut decision = SelectionDecision::for_categories(cells);
        let mut pools: [Vec<(Category, CellCoord)>; 3] = Default::default();
        for (category, set) in cells {
            if let Some(group) = self.groups.group_of(category) {
                pools[group.index()].extend(set.iter().map(|coord| (category.clone(), *coord)));
            }
        }

        let available: usize = pools.iter().map(Vec::len).sum();
        if target >= available {
            for (category, coord) in pools.into_iter().flatten() {
                decision.keep(&category, coord);
            }
            return Ok(decision);
        }

        let mut chosen = 0;
        while chosen < target {
            let drawn = self.weights.pick(rng.gen::<f64>());
            let group = if pools[drawn.index()].is_empty() {
                match PerformanceGroup::ALL
                    .into_iter()
                    .find(|alt| *alt != drawn && !pools[alt.index()].is_empty())
                {
                    Some(alt) => {
                        debug!(drawn = ?drawn, fallback = ?alt, "drawn group exhausted");
                        alt
                    }
                    None => break,
                }
            } else {
                drawn
            };
            let pool = &mut pools[group.index()];
            let (category, coord) = pool.swap_remove(rng.gen_range(0..pool.len()));
            if decision.keep(&category, coord) {
                chosen += 1;
            }
        }
        Ok(decision)
    }
}
