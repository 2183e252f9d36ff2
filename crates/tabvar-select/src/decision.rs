//! Kept-coordinate decisions produced by selection policies.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tabvar_core::{Category, CellCoord, PerturbedCellSet};

/// Perturbed cells of one file, keyed by category in name order.
pub type FileCells = BTreeMap<Category, PerturbedCellSet>;

/// Total perturbed cells across every category of a file.
pub fn total_cells(cells: &FileCells) -> usize {
    cells.values().map(PerturbedCellSet::len).sum()
}

/// Coordinates each participating category keeps for one file.
///
/// Categories missing from the decision do not take part in reconciliation
/// or merging for the file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionDecision {
    kept: BTreeMap<Category, BTreeSet<CellCoord>>,
}

impl SelectionDecision {
    /// Every category participates and keeps nothing yet.
    pub fn for_categories(cells: &FileCells) -> Self {
        Self {
            kept: cells
                .keys()
                .map(|category| (category.clone(), BTreeSet::new()))
                .collect(),
        }
    }

    /// Every category participates and keeps all of its perturbed cells.
    pub fn keep_all(cells: &FileCells) -> Self {
        Self {
            kept: cells
                .iter()
                .map(|(category, set)| (category.clone(), set.iter().copied().collect()))
                .collect(),
        }
    }

    /// Adds `category` as a participant without kept cells.
    pub fn include(&mut self, category: &Category) {
        self.kept.entry(category.clone()).or_default();
    }

    /// Records a kept coordinate. Returns false when it was already kept.
    pub fn keep(&mut self, category: &Category, coord: CellCoord) -> bool {
        self.kept.entry(category.clone()).or_default().insert(coord)
    }

    /// Coordinates kept by `category`, if it participates.
    pub fn kept(&self, category: &Category) -> Option<&BTreeSet<CellCoord>> {
        self.kept.get(category)
    }

    /// True when `category` takes part in the file's output.
    pub fn participates(&self, category: &Category) -> bool {
        self.kept.contains_key(category)
    }

    /// Participating categories in name order.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.kept.keys()
    }

    /// Iterates `(category, kept coordinates)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&Category, &BTreeSet<CellCoord>)> {
        self.kept.iter()
    }

    /// Number of kept `(category, coordinate)` pairs.
    pub fn total_kept(&self) -> usize {
        self.kept.values().map(BTreeSet::len).sum()
    }

    /// True when no category participates.
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
