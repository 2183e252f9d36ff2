#![deny(missing_docs)]
#![doc = "Turns selection decisions into published tables: reconciliation of unkept perturbations against the baseline, merging of per-category variants with row labels, and marker stripping for release."]

pub mod merge;
pub mod reconcile;
pub mod strip;

pub use merge::{merge, structural_key, MergedOutput, RowLabel};
pub use reconcile::{
    content_match, reconcile, CellOutcome, MatchOutcome, ReconcileStats, Reconciliation,
    Resolution,
};
pub use strip::{coerce_stripped, strip_markers};
