use std::collections::BTreeSet;

use tabvar_core::{Category, RngHandle, VariantError};

use super::SelectionPolicy;
use crate::decision::{FileCells, SelectionDecision};

/// Listed categories keep every perturbed cell; the rest are left out of
/// the file's output entirely.
#[derive(Debug, Clone, Default)]
pub struct PassThrough {
    categories: BTreeSet<Category>,
}

impl PassThrough {
    /// Creates the policy for the given categories.
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }
}

impl SelectionPolicy for PassThrough {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    fn select(
        &self,
        cells: &FileCells,
        _target: usize,
        _rng: &mut RngHandle,
    ) -> Result<SelectionDecision, VariantError> {
        let mut decision = SelectionDecision::default();
        for (category, set) in cells {
            if !self.categories.contains(category) {
                continue;
            }
            decision.include(category);
            for coord in set.iter() {
                decision.keep(category, *coord);
            }
        }
        Ok(decision)
    }
}
