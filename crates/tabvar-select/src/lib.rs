#![deny(missing_docs)]
#![doc = "Perturbation indexing, corpus statistics, retention targets and the selection policies that decide which perturbed cells survive in a file's output."]

pub mod corpus;
pub mod decision;
pub mod groups;
pub mod index;
pub mod policy;
pub mod target;

pub use corpus::{CorpusAggregator, CorpusStats};
pub use decision::{total_cells, FileCells, SelectionDecision};
pub use groups::{
    CategoryScores, GroupWeights, PerformanceGroup, PerformanceGroups, ScoreMapping,
    DEFAULT_EPSILON,
};
pub use index::scan;
pub use policy::{
    rank_weights, GroupFraction, GroupFractions, GroupStratifiedTwoStep,
    GroupWeightedStratified, PassThrough, RankWeighted, SelectionPolicy, StructuralExclusivity,
    UniformTwoStep, DEFAULT_COLUMN_BUDGET,
};
pub use target::RetentionTarget;
