use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use tabvar_core::{ErrorInfo, RngHandle, VariantError};

use super::SelectionPolicy;
use crate::decision::{FileCells, SelectionDecision};

/// Column budget used when none is configured.
pub const DEFAULT_COLUMN_BUDGET: usize = 4;

/// Keeps at most one coordinate per row and at most `K` per column.
///
/// Candidates from every category are pooled and visited in a seeded random
/// order; the first candidate that respects both limits wins.
#[derive(Debug, Clone, Copy)]
pub struct StructuralExclusivity {
    column_budget: usize,
}

impl StructuralExclusivity {
    /// Creates the policy with column budget `k` (at least 1).
    pub fn new(column_budget: usize) -> Result<Self, VariantError> {
        if column_budget == 0 {
            return Err(VariantError::Config(ErrorInfo::new(
                "column_budget",
                "structural exclusivity needs a column budget of at least 1",
            )));
        }
        Ok(Self { column_budget })
    }

    /// The per-column budget `K`.
    pub fn column_budget(&self) -> usize {
        self.column_budget
    }
}

impl Default for StructuralExclusivity {
    fn default() -> Self {
        Self {
            column_budget: DEFAULT_COLUMN_BUDGET,
        }
    }
}

impl SelectionPolicy for StructuralExclusivity {
    fn name(&self) -> &'static str {
        "structural-exclusivity"
    }

    fn select(
        &self,
        cells: &FileCells,
        _target: usize,
        rng: &mut RngHandle,
    ) -> Result<SelectionDecision, VariantError> {
        let mut decision = SelectionDecision::for_categories(cells);
        let mut candidates: Vec<_> = cells
            .iter()
            .flat_map(|(category, set)| set.iter().map(move |coord| (category, *coord)))
            .collect();
        candidates.shuffle(rng);

        let mut used_rows = BTreeSet::new();
        let mut column_counts: BTreeMap<usize, usize> = BTreeMap::new();
        for (category, coord) in candidates {
            if used_rows.contains(&coord.row()) {
                continue;
            }
            let used = column_counts.entry(coord.col()).or_default();
            if *used >= self.column_budget {
                continue;
            }
            *used += 1;
            used_rows.insert(coord.row());
            decision.keep(category, coord);
        }
        Ok(decision)
    }
}
