use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tabvar_core::{Category, ErrorInfo, RngHandle, Sentinel, Table, VariantError};
use tabvar_reconcile::{merge, reconcile, strip_markers, MergedOutput};
use tabvar_select::{
    scan, total_cells, CorpusAggregator, CorpusStats, FileCells, RetentionTarget, SelectionPolicy,
};
use tracing::{debug, error, info, warn};

use crate::layout::{CorpusLayout, FileInputs};
use crate::plan::{load_plan, Plan};
use crate::report::{
    provenance, CategorySummary, FileFailure, FileState, FileSummary, RunReport, RunTotals,
};
use crate::serde::{table_to_json_bytes, to_canonical_json_bytes};

const MERGED_DIR: &str = "Merged";
const LABELS_DIR: &str = "labels";
const STRIPPED_DIR: &str = "Stripped";

fn io_error(code: &str, path: &Path, err: impl ToString) -> VariantError {
    VariantError::Io(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// Options governing a run.
#[derive(Debug, Clone, Default)]
pub struct RunOpts {
    /// Restricts the run to these file ids when non-empty.
    pub only: Vec<String>,
    /// Processes at most this many files.
    pub limit: Option<usize>,
}

/// Everything phase two produced for one file.
#[derive(Debug, Clone)]
pub struct FileArtifacts {
    /// Audit record.
    pub summary: FileSummary,
    /// Reconciled table per participating category.
    pub reconciled: BTreeMap<Category, Table>,
    /// Merged table and labels; absent for skipped files.
    pub merged: Option<MergedOutput>,
}

/// Phase one: one sweep over the corpus accumulating per-category totals.
pub fn collect_corpus_stats(
    layout: &CorpusLayout,
    file_ids: &[String],
    sentinel: &Sentinel,
) -> CorpusStats {
    let mut aggregator = CorpusAggregator::new();
    for file_id in file_ids {
        let inputs = match layout.load_file(file_id) {
            Ok(inputs) => inputs,
            Err(err) => {
                warn!(file_id = %file_id, error = %err, "baseline unreadable during corpus sweep");
                continue;
            }
        };
        aggregator.begin_file();
        for (category, variant) in &inputs.variants {
            aggregator.observe(category, &scan(variant, sentinel));
        }
    }
    let stats = aggregator.finish();
    info!(
        files = stats.files,
        perturbed = stats.grand_total(),
        "corpus statistics collected"
    );
    stats
}

/// Phase two for one file: select, reconcile and merge. Touches no disk.
pub fn process_file(
    inputs: FileInputs,
    policy: &dyn SelectionPolicy,
    target: &RetentionTarget,
    sentinel: &Sentinel,
    seed: u64,
) -> Result<FileArtifacts, VariantError> {
    let FileInputs {
        file_id,
        baseline,
        variants,
        skipped,
    } = inputs;
    let cells: FileCells = variants
        .iter()
        .map(|(category, variant)| (category.clone(), scan(variant, sentinel)))
        .collect();

    let mut summary = FileSummary::empty(&file_id, FileState::Complete);
    summary.baseline_rows = baseline.len();
    summary.skipped = skipped;

    if total_cells(&cells) == 0 {
        warn!(file_id = %file_id, "no perturbed cells, skipping file");
        summary.status = FileState::Skipped;
        summary.reason = Some("no perturbed cells in any category".to_string());
        return Ok(FileArtifacts {
            summary,
            reconciled: BTreeMap::new(),
            merged: None,
        });
    }

    let counts: Vec<usize> = cells.values().map(|set| set.len()).collect();
    let resolved = target.resolve(&counts, baseline.len());
    if policy.uses_target() {
        summary.target = Some(resolved);
    }
    let mut rng = RngHandle::for_substream(seed, &file_id);
    let decision = policy.select(&cells, resolved, &mut rng)?;
    debug!(file_id = %file_id, kept = decision.total_kept(), "selection decided");

    let empty = BTreeSet::new();
    let mut reconciled = BTreeMap::new();
    for (category, perturbed) in &cells {
        if !decision.participates(category) {
            summary.excluded.push(category.clone());
            continue;
        }
        let keep = decision.kept(category).unwrap_or(&empty);
        let variant = variants.get(category).ok_or_else(|| {
            VariantError::Selection(
                ErrorInfo::new("category_unknown", "decision names a category without a variant")
                    .with_context("category", category.as_str()),
            )
        })?;
        let result = reconcile(&baseline, variant, perturbed, keep)?;
        if result.stats.fallbacks() > 0 {
            warn!(
                file_id = %file_id,
                %category,
                ambiguous = result.stats.ambiguous.len(),
                no_match = result.stats.no_match.len(),
                "positional fallback used"
            );
        }
        summary.categories.insert(
            category.clone(),
            CategorySummary {
                perturbed: perturbed.len(),
                kept: keep.len(),
                kept_cells: keep.iter().copied().collect(),
                reconcile: result.stats,
            },
        );
        reconciled.insert(category.clone(), result.table);
    }

    let merged = merge(&file_id, &reconciled, sentinel)?;
    summary.merged_rows = merged.table.len();
    summary.anomalous_rows = merged.anomalous_rows();
    Ok(FileArtifacts {
        summary,
        reconciled,
        merged: Some(merged),
    })
}

/// Writes the on-disk artefacts of one file under `out`.
///
/// Every artefact is rendered before the first write. If a write fails the
/// files already written for this file are removed, so a failed file leaves
/// no partial outputs behind.
pub fn write_file_artifacts(
    artifacts: &FileArtifacts,
    plan: &Plan,
    sentinel: &Sentinel,
    out: &Path,
) -> Result<(), VariantError> {
    let Some(merged) = &artifacts.merged else {
        return Ok(());
    };
    let file_id = &artifacts.summary.file_id;
    let mut pending: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    if plan.outputs.reconciled {
        for (category, table) in &artifacts.reconciled {
            pending.push((
                out.join(category.as_str()).join(format!("{file_id}.json")),
                table_to_json_bytes(table)?,
            ));
        }
    }
    pending.push((
        out.join(MERGED_DIR).join(format!("{file_id}.json")),
        table_to_json_bytes(&merged.table)?,
    ));
    let labels = serde_json::to_vec_pretty(&merged.labels)
        .map_err(|err| VariantError::Serde(ErrorInfo::new("labels_write", err.to_string())))?;
    pending.push((
        out.join(LABELS_DIR).join(format!("{file_id}_labels.json")),
        labels,
    ));
    if plan.outputs.strip {
        let stripped = strip_markers(&merged.table, sentinel)?;
        pending.push((
            out.join(STRIPPED_DIR).join(format!("{file_id}.json")),
            table_to_json_bytes(&stripped)?,
        ));
    }

    let mut written: Vec<&Path> = Vec::with_capacity(pending.len());
    for (path, bytes) in &pending {
        if let Err(err) = write_bytes(path, bytes) {
            for done in written {
                if let Err(remove_err) = fs::remove_file(done) {
                    warn!(path = %done.display(), error = %remove_err, "could not remove partial output");
                }
            }
            return Err(err);
        }
        written.push(path);
    }
    Ok(())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), VariantError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| io_error("out_dir", parent, err))?;
    }
    fs::write(path, bytes).map_err(|err| io_error("artifact_write", path, err))
}

/// Executes a plan: phase one when the policy needs corpus statistics,
/// then phase two for every file. A failing file is recorded and the
/// batch continues.
pub fn run_plan(plan: &Plan, out: &Path, opts: &RunOpts) -> Result<RunReport, VariantError> {
    plan.validate()?;
    fs::create_dir_all(out).map_err(|err| io_error("plan_out_dir", out, err))?;
    let layout = CorpusLayout::discover(&plan.corpus, &plan.corpus_root())?;
    let sentinel = plan.sentinel();
    let file_ids = select_files(layout.file_ids()?, opts);
    info!(
        files = file_ids.len(),
        categories = layout.categories().len(),
        "starting run"
    );

    let stats = plan
        .policy
        .needs_corpus_stats()
        .then(|| collect_corpus_stats(&layout, &file_ids, &sentinel));
    let built = plan.policy.build(stats.as_ref())?;
    let policy_name = built.policy.name();

    let mut summaries = BTreeMap::new();
    for file_id in &file_ids {
        let outcome = layout.load_file(file_id).and_then(|inputs| {
            let artifacts =
                process_file(inputs, built.policy.as_ref(), &plan.target, &sentinel, plan.seed)?;
            write_file_artifacts(&artifacts, plan, &sentinel, out)?;
            Ok(artifacts.summary)
        });
        let summary = match outcome {
            Ok(summary) => {
                info!(file_id = %file_id, status = ?summary.status, kept = summary.kept(), "file processed");
                summary
            }
            Err(err) => {
                error!(file_id = %file_id, error = %err, "file failed");
                FileSummary::failed(file_id, &err)
            }
        };
        summaries.insert(file_id.clone(), summary);
    }

    let totals = RunTotals::from_summaries(summaries.values());
    let failures = summaries
        .values()
        .filter(|summary| summary.status == FileState::Failed)
        .map(|summary| FileFailure {
            file_id: summary.file_id.clone(),
            error: summary.error.clone().unwrap_or_default(),
        })
        .collect();
    let report = RunReport {
        schema: Default::default(),
        provenance: provenance(plan, policy_name)?,
        categories: layout
            .categories()
            .iter()
            .map(|dir| dir.category.clone())
            .collect(),
        corpus: stats,
        groups: built.groups,
        group_weights: built.weights,
        totals,
        failures,
    };

    write_bytes(&out.join("summary.json"), &to_canonical_json_bytes(&summaries)?)?;
    write_bytes(&out.join("run_report.json"), &to_canonical_json_bytes(&report)?)?;
    info!(
        complete = report.totals.complete,
        skipped = report.totals.skipped,
        failed = report.totals.failed,
        "run finished"
    );
    Ok(report)
}

/// Loads a plan from disk and executes it.
pub fn run_plan_from_path(
    plan_path: &Path,
    out: &Path,
    opts: &RunOpts,
) -> Result<RunReport, VariantError> {
    let plan = load_plan(plan_path)?;
    run_plan(&plan, out, opts)
}

fn select_files(mut file_ids: Vec<String>, opts: &RunOpts) -> Vec<String> {
    if !opts.only.is_empty() {
        file_ids.retain(|id| opts.only.contains(id));
    }
    if let Some(limit) = opts.limit {
        file_ids.truncate(limit);
    }
    file_ids
}
