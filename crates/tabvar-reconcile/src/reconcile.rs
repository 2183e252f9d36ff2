//! Reverting perturbations that were not selected.
//!
//! Every perturbed coordinate outside the keep set is restored from the
//! baseline. The baseline row is located by content: the row whose values in
//! every other column equal the variant row's. When no row or more than one
//! row qualifies the cell falls back to the baseline row at the same
//! position, and the fallback is recorded in [`ReconcileStats`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabvar_core::{CellCoord, ErrorInfo, PerturbedCellSet, Table, VariantError};
use tracing::{debug, warn};

/// Result of searching the baseline for a row matching on every other column.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Exactly one baseline row matched; carries its value for the target column.
    Unique(Value),
    /// Several baseline rows matched.
    Ambiguous(usize),
    /// No baseline row matched.
    NoMatch,
}

/// How one reverted cell obtained its baseline value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Restored from the unique content match.
    Content,
    /// Restored positionally after several rows matched.
    PositionalAmbiguous,
    /// Restored positionally after no row matched.
    PositionalNoMatch,
}

/// Resolution of one reverted coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellOutcome {
    /// Reverted coordinate.
    pub coord: CellCoord,
    /// How its value was found.
    pub resolution: Resolution,
}

/// Counters and fallback coordinates of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// Cells left marked because they were kept.
    pub kept: usize,
    /// Cells restored through a unique content match.
    pub content_matches: usize,
    /// Cells restored positionally because several baseline rows matched.
    pub ambiguous: Vec<CellCoord>,
    /// Cells restored positionally because no baseline row matched.
    pub no_match: Vec<CellCoord>,
}

impl ReconcileStats {
    /// Number of cells restored from the baseline by either path.
    pub fn reverted(&self) -> usize {
        self.content_matches + self.fallbacks()
    }

    /// Number of cells that took the positional fallback.
    pub fn fallbacks(&self) -> usize {
        self.ambiguous.len() + self.no_match.len()
    }

    fn record(&mut self, outcome: &CellOutcome) {
        match outcome.resolution {
            Resolution::Content => self.content_matches += 1,
            Resolution::PositionalAmbiguous => self.ambiguous.push(outcome.coord),
            Resolution::PositionalNoMatch => self.no_match.push(outcome.coord),
        }
    }
}

/// A reconciled variant and the record of how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Variant with every unkept perturbation reverted.
    pub table: Table,
    /// Per-cell resolutions in row-major order.
    pub outcomes: Vec<CellOutcome>,
    /// Aggregate counters.
    pub stats: ReconcileStats,
}

/// Searches `baseline` for rows equal to `row` on every column except `col_offset`.
pub fn content_match(baseline: &Table, row: &[Value], col_offset: usize) -> MatchOutcome {
    let mut candidates = baseline.rows().iter().filter(|candidate| {
        candidate
            .iter()
            .zip(row)
            .enumerate()
            .all(|(offset, (expected, found))| offset == col_offset || expected == found)
    });
    let Some(first) = candidates.next() else {
        return MatchOutcome::NoMatch;
    };
    match candidates.count() {
        0 => MatchOutcome::Unique(first[col_offset].clone()),
        more => MatchOutcome::Ambiguous(more + 1),
    }
}

/// Restores every coordinate of `perturbed` that is not in `keep` from
/// `baseline`, leaving kept cells with their marker.
///
/// Cells are processed in row-major order on a working copy, so a cell
/// restored earlier in a row takes part in the content match of later cells
/// in that row. Coordinates in `keep` that were never perturbed are ignored.
pub fn reconcile(
    baseline: &Table,
    variant: &Table,
    perturbed: &PerturbedCellSet,
    keep: &BTreeSet<CellCoord>,
) -> Result<Reconciliation, VariantError> {
    baseline.ensure_same_columns(variant)?;
    if baseline.len() != variant.len() {
        return Err(VariantError::RowCount(
            ErrorInfo::new("row_count", "variant row count differs from the baseline")
                .with_context("expected", baseline.len().to_string())
                .with_context("found", variant.len().to_string()),
        ));
    }

    let mut working = variant.clone();
    let mut outcomes = Vec::new();
    let mut stats = ReconcileStats::default();
    for coord in perturbed.iter().copied() {
        if keep.contains(&coord) {
            stats.kept += 1;
            continue;
        }
        let row = working.row(coord.row_offset()).ok_or_else(|| outside(coord))?;
        if coord.col_offset() >= row.len() {
            return Err(outside(coord));
        }
        let (value, resolution) = match content_match(baseline, row, coord.col_offset()) {
            MatchOutcome::Unique(value) => (value, Resolution::Content),
            MatchOutcome::Ambiguous(candidates) => {
                warn!(%coord, candidates, "ambiguous content match, using positional fallback");
                (positional(baseline, coord)?, Resolution::PositionalAmbiguous)
            }
            MatchOutcome::NoMatch => {
                warn!(%coord, "no content match, using positional fallback");
                (positional(baseline, coord)?, Resolution::PositionalNoMatch)
            }
        };
        debug!(%coord, ?resolution, "reverted perturbed cell");
        working.set_cell(coord, value)?;
        let outcome = CellOutcome { coord, resolution };
        stats.record(&outcome);
        outcomes.push(outcome);
    }

    Ok(Reconciliation {
        table: working,
        outcomes,
        stats,
    })
}

fn positional(baseline: &Table, coord: CellCoord) -> Result<Value, VariantError> {
    baseline.cell(coord).cloned().ok_or_else(|| outside(coord))
}

fn outside(coord: CellCoord) -> VariantError {
    VariantError::Reconcile(
        ErrorInfo::new("coord_out_of_range", "perturbed coordinate lies outside the variant")
            .with_context("coord", coord.to_string()),
    )
}
