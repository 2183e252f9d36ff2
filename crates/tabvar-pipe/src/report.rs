use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tabvar_core::{Category, CellCoord, RunProvenance, SchemaVersion, VariantError};
use tabvar_reconcile::ReconcileStats;
use tabvar_select::{CorpusStats, GroupWeights, PerformanceGroups};

use crate::layout::SkippedCategory;
use crate::plan::Plan;

/// Outcome of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileState {
    /// Outputs written.
    Complete,
    /// Nothing to select; no outputs written.
    Skipped,
    /// Processing raised an error.
    Failed,
}

/// Per-category audit record of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CategorySummary {
    /// Perturbed cells found in the variant.
    pub perturbed: usize,
    /// Cells kept by the selection.
    pub kept: usize,
    /// Exact coordinates kept.
    pub kept_cells: Vec<CellCoord>,
    /// How the unkept cells were restored.
    pub reconcile: ReconcileStats,
}

/// Audit record of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// File id.
    pub file_id: String,
    /// Outcome.
    pub status: FileState,
    /// Error text of a failed file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Why a skipped file produced no outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Baseline row count.
    pub baseline_rows: usize,
    /// Resolved retention target, for policies that read it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
    /// Participating categories.
    pub categories: BTreeMap<Category, CategorySummary>,
    /// Categories present but not participating (left out by the policy).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<Category>,
    /// Variants that could not be used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedCategory>,
    /// Rows in the merged table.
    pub merged_rows: usize,
    /// Merged rows carrying a label.
    pub anomalous_rows: usize,
}

impl FileSummary {
    /// Summary of a file that could not be processed.
    pub fn failed(file_id: &str, err: &VariantError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::empty(file_id, FileState::Failed)
        }
    }

    pub(crate) fn empty(file_id: &str, status: FileState) -> Self {
        Self {
            file_id: file_id.to_string(),
            status,
            error: None,
            reason: None,
            baseline_rows: 0,
            target: None,
            categories: BTreeMap::new(),
            excluded: Vec::new(),
            skipped: Vec::new(),
            merged_rows: 0,
            anomalous_rows: 0,
        }
    }

    /// Perturbed cells across participating categories.
    pub fn perturbed(&self) -> usize {
        self.categories.values().map(|c| c.perturbed).sum()
    }

    /// Kept cells across participating categories.
    pub fn kept(&self) -> usize {
        self.categories.values().map(|c| c.kept).sum()
    }
}

/// Aggregate counters over a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunTotals {
    /// Files visited.
    pub files: usize,
    /// Files with outputs.
    pub complete: usize,
    /// Files with nothing to select.
    pub skipped: usize,
    /// Files that failed.
    pub failed: usize,
    /// Perturbed cells seen in participating variants.
    pub perturbed: usize,
    /// Cells kept.
    pub kept: usize,
    /// Cells restored through a unique content match.
    pub content_matches: usize,
    /// Cells restored through the positional fallback.
    pub fallbacks: usize,
    /// Variants skipped as unusable.
    pub skipped_variants: usize,
}

impl RunTotals {
    /// Folds the counters of every summary.
    pub fn from_summaries<'a>(summaries: impl IntoIterator<Item = &'a FileSummary>) -> Self {
        let mut totals = Self::default();
        for summary in summaries {
            totals.files += 1;
            match summary.status {
                FileState::Complete => totals.complete += 1,
                FileState::Skipped => totals.skipped += 1,
                FileState::Failed => totals.failed += 1,
            }
            totals.perturbed += summary.perturbed();
            totals.kept += summary.kept();
            totals.skipped_variants += summary.skipped.len();
            for category in summary.categories.values() {
                totals.content_matches += category.reconcile.content_matches;
                totals.fallbacks += category.reconcile.fallbacks();
            }
        }
        totals
    }
}

/// A failed file and its error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// File id.
    pub file_id: String,
    /// Rendered error.
    pub error: String,
}

/// Canonical report for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema of the report and summaries.
    pub schema: SchemaVersion,
    /// Provenance of the run.
    pub provenance: RunProvenance,
    /// Categories discovered in the corpus.
    pub categories: Vec<Category>,
    /// Phase-one statistics, when the policy needed them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus: Option<CorpusStats>,
    /// Group assignment used by group-based policies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<PerformanceGroups>,
    /// Group probabilities used by the weighted policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_weights: Option<GroupWeights>,
    /// Aggregate counters.
    pub totals: RunTotals,
    /// Files that failed.
    pub failures: Vec<FileFailure>,
}

/// Builds the provenance block for a run of `plan`.
pub fn provenance(plan: &Plan, policy: &str) -> Result<RunProvenance, VariantError> {
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    Ok(RunProvenance {
        plan_hash: plan.plan_hash()?,
        policy: policy.to_string(),
        seed: plan.seed,
        created_at: Utc::now().to_rfc3339(),
        tool_versions,
    })
}
