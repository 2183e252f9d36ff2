//! Phase-one corpus statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabvar_core::{Category, PerturbedCellSet};

use crate::groups::{PerformanceGroup, PerformanceGroups};

/// Immutable corpus-wide perturbation totals, built once before any
/// per-file selection runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Total perturbed cells per category across every file.
    pub totals: BTreeMap<Category, u64>,
    /// Number of files in which each category supplied a variant.
    pub variant_files: BTreeMap<Category, u64>,
    /// Number of baseline files visited.
    pub files: u64,
}

impl CorpusStats {
    /// Total perturbed cells recorded for `category`.
    pub fn total(&self, category: &Category) -> u64 {
        self.totals.get(category).copied().unwrap_or_default()
    }

    /// Total perturbed cells across all categories.
    pub fn grand_total(&self) -> u64 {
        self.totals.values().sum()
    }

    /// Perturbation volume of one performance group.
    pub fn group_volume(&self, groups: &PerformanceGroups, group: PerformanceGroup) -> u64 {
        groups
            .members(group)
            .iter()
            .map(|category| self.total(category))
            .sum()
    }

    /// Categories with recorded volume that belong to no performance group.
    pub fn ungrouped(&self, groups: &PerformanceGroups) -> Vec<Category> {
        self.totals
            .keys()
            .filter(|category| groups.group_of(category).is_none())
            .cloned()
            .collect()
    }
}

/// Accumulates [`CorpusStats`] over one sweep of the corpus.
#[derive(Debug, Default)]
pub struct CorpusAggregator {
    stats: CorpusStats,
}

impl CorpusAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of a new baseline file.
    pub fn begin_file(&mut self) {
        self.stats.files += 1;
    }

    /// Records the perturbed cells of one category's variant.
    pub fn observe(&mut self, category: &Category, cells: &PerturbedCellSet) {
        *self.stats.totals.entry(category.clone()).or_default() += cells.len() as u64;
        *self
            .stats
            .variant_files
            .entry(category.clone())
            .or_default() += 1;
    }

    /// Freezes the accumulated totals.
    pub fn finish(self) -> CorpusStats {
        self.stats
    }
}
