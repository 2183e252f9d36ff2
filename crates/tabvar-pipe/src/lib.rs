#![deny(missing_docs)]
#![doc = "Two-phase variant pipeline: YAML run plans, corpus discovery, per-file selection, reconciliation and merging, and the canonical summaries of a run."]

/// Phase orchestration and artefact writing.
pub mod dispatch;
/// Canonical hashing helpers.
pub mod hash;
/// Corpus discovery and per-file input loading.
pub mod layout;
/// Run plan schema and loading.
pub mod plan;
/// Summary and report assembly.
pub mod report;
/// Canonical JSON and YAML helpers.
pub mod serde;

pub use dispatch::{
    collect_corpus_stats, process_file, run_plan, run_plan_from_path, write_file_artifacts,
    FileArtifacts, RunOpts,
};
pub use layout::{read_table, CategoryDir, CorpusLayout, FileInputs, SkippedCategory};
pub use plan::{
    load_plan, save_plan, BuiltPolicy, CorpusSpec, GroupingSpec, OutputSpec, Plan, PolicySpec,
};
pub use report::{
    CategorySummary, FileFailure, FileState, FileSummary, RunReport, RunTotals,
};
