use rand::Rng;
use tabvar_core::{Category, CellCoord, RngHandle, VariantError};

use super::SelectionPolicy;
use crate::decision::{total_cells, FileCells, SelectionDecision};

/// Two-step uniform draw: a category uniformly among those with cells left,
/// then a coordinate uniformly from that category's remaining pool.
///
/// This matches uniform sampling from the union of every category's pool
/// replicated up to a common size, without materialising the replication.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformTwoStep;

impl SelectionPolicy for UniformTwoStep {
    fn name(&self) -> &'static str {
        "uniform-two-step"
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
        if target >= total_cells(cells) {
            return Ok(SelectionDecision::keep_all(cells));
        }
        let mut decision = SelectionDecision::for_categories(cells);
        let pools = cells
            .iter()
            .map(|(category, set)| (category.clone(), set.as_slice().to_vec()))
            .collect();
        draw_two_step(pools, target, rng, &mut decision);
        Ok(decision)
    }
}

/// Draws up to `target` distinct pairs from `pools` into `decision`.
pub(crate) fn draw_two_step(
    mut pools: Vec<(Category, Vec<CellCoord>)>,
    target: usize,
    rng: &mut RngHandle,
    decision: &mut SelectionDecision,
) {
    let mut chosen = 0;
    while chosen < target {
        let active: Vec<usize> = pools
            .iter()
            .enumerate()
            .filter(|(_, (_, pool))| !pool.is_empty())
            .map(|(index, _)| index)
            .collect();
        if active.is_empty() {
            break;
        }
        let (category, pool) = &mut pools[active[rng.gen_range(0..active.len())]];
        let coord = pool.swap_remove(rng.gen_range(0..pool.len()));
        if decision.keep(category, coord) {
            chosen += 1;
        }
    }
}
