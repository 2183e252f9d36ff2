use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tabvar_core::{Category, ErrorInfo, Sentinel, VariantError, DEFAULT_SENTINEL};
use tabvar_select::{
    CategoryScores, CorpusStats, GroupFraction, GroupFractions, GroupStratifiedTwoStep,
    GroupWeightedStratified, GroupWeights, PassThrough, PerformanceGroups, RankWeighted,
    RetentionTarget, ScoreMapping, SelectionPolicy, StructuralExclusivity, UniformTwoStep,
    DEFAULT_COLUMN_BUDGET, DEFAULT_EPSILON,
};
use tracing::warn;

use crate::hash::stable_hash_string;
use crate::serde::{from_yaml_slice, to_yaml_string};

fn io_error(code: &str, err: impl ToString) -> VariantError {
    VariantError::Io(ErrorInfo::new(code, err.to_string()))
}

fn config_error(code: &str, message: impl Into<String>) -> VariantError {
    VariantError::Config(ErrorInfo::new(code, message))
}

/// Where baselines and variants live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSpec {
    /// Corpus root; relative paths resolve against the plan's directory.
    pub root: PathBuf,
    /// Sub-directory holding the baseline tables.
    #[serde(default = "CorpusSpec::default_baseline_dir")]
    pub baseline_dir: String,
    /// Suffix appended to the file id in variant file names.
    #[serde(default = "CorpusSpec::default_variant_suffix")]
    pub variant_suffix: String,
    /// Suffix stripped from category directory names, e.g. `_WikiTQ`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_suffix: Option<String>,
    /// Restricts the run to these categories when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
}

impl CorpusSpec {
    fn default_baseline_dir() -> String {
        "Ground_truth".to_string()
    }

    fn default_variant_suffix() -> String {
        "_updated".to_string()
    }
}

/// How categories are split into performance groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum GroupingSpec {
    /// Groups listed by name.
    Explicit(PerformanceGroups),
    /// Groups derived from the policy scores by percentile thresholds.
    Percentile {
        /// Scores at or above this percentile are over-performing.
        #[serde(default = "GroupingSpec::default_high")]
        high: f64,
        /// Scores at or above this percentile are mid-performing.
        #[serde(default = "GroupingSpec::default_low")]
        low: f64,
    },
}

impl GroupingSpec {
    fn default_high() -> f64 {
        90.0
    }

    fn default_low() -> f64 {
        40.0
    }

    /// Resolves the group assignment.
    pub fn resolve(&self, scores: &CategoryScores) -> Result<PerformanceGroups, VariantError> {
        let groups = match self {
            GroupingSpec::Explicit(groups) => groups.clone(),
            GroupingSpec::Percentile { high, low } => {
                if low > high {
                    return Err(config_error(
                        "percentile_order",
                        "low percentile must not exceed the high percentile",
                    ));
                }
                PerformanceGroups::from_percentiles(scores, *high, *low)?
            }
        };
        groups.validate()?;
        Ok(groups)
    }
}

/// Selection policy named in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PolicySpec {
    /// Uniform draw of a category, then of one of its coordinates.
    UniformTwoStep,
    /// Group draw weighted by corpus volume and scores.
    GroupWeightedStratified {
        /// Group assignment.
        grouping: GroupingSpec,
        /// Performance score per category.
        scores: CategoryScores,
        /// Score-to-mass mapping.
        #[serde(default)]
        mapping: ScoreMapping,
        /// Minimum probability of a non-empty group.
        #[serde(default = "PolicySpec::default_epsilon")]
        epsilon: f64,
    },
    /// One kept cell per row, bounded per column.
    StructuralExclusivity {
        /// Per-column budget `K`.
        #[serde(default = "PolicySpec::default_column_budget")]
        column_budget: usize,
    },
    /// Proportional keep by count rank.
    RankWeighted,
    /// Uniform two-step draw inside each group.
    GroupStratifiedTwoStep {
        /// Group assignment.
        grouping: GroupingSpec,
        /// Scores used by percentile grouping.
        #[serde(default, skip_serializing_if = "CategoryScores::is_empty")]
        scores: CategoryScores,
    },
    /// Fixed keep fraction per group.
    GroupFraction {
        /// Group assignment.
        grouping: GroupingSpec,
        /// Scores used by percentile grouping.
        #[serde(default, skip_serializing_if = "CategoryScores::is_empty")]
        scores: CategoryScores,
        /// Keep fraction per group.
        #[serde(default)]
        fractions: GroupFractions,
    },
    /// Listed categories keep everything; others are left out.
    PassThrough {
        /// Categories passed through.
        categories: Vec<Category>,
    },
}

/// A constructed policy together with what was derived to build it.
pub struct BuiltPolicy {
    /// The policy itself.
    pub policy: Box<dyn SelectionPolicy>,
    /// Group assignment, for group-based policies.
    pub groups: Option<PerformanceGroups>,
    /// Group draw probabilities, for the weighted policy.
    pub weights: Option<GroupWeights>,
}

impl PolicySpec {
    fn default_epsilon() -> f64 {
        DEFAULT_EPSILON
    }

    fn default_column_budget() -> usize {
        DEFAULT_COLUMN_BUDGET
    }

    /// True when the policy needs phase-one corpus statistics.
    pub fn needs_corpus_stats(&self) -> bool {
        matches!(self, PolicySpec::GroupWeightedStratified { .. })
    }

    /// Builds the policy. `stats` must be present when
    /// [`PolicySpec::needs_corpus_stats`] is true.
    pub fn build(&self, stats: Option<&CorpusStats>) -> Result<BuiltPolicy, VariantError> {
        let built = match self {
            PolicySpec::UniformTwoStep => plain(UniformTwoStep),
            PolicySpec::RankWeighted => plain(RankWeighted),
            PolicySpec::StructuralExclusivity { column_budget } => {
                plain(StructuralExclusivity::new(*column_budget)?)
            }
            PolicySpec::PassThrough { categories } => {
                plain(PassThrough::new(categories.iter().cloned()))
            }
            PolicySpec::GroupStratifiedTwoStep { grouping, scores } => {
                let groups = grouping.resolve(scores)?;
                BuiltPolicy {
                    policy: Box::new(GroupStratifiedTwoStep::new(groups.clone())),
                    groups: Some(groups),
                    weights: None,
                }
            }
            PolicySpec::GroupFraction {
                grouping,
                scores,
                fractions,
            } => {
                let groups = grouping.resolve(scores)?;
                BuiltPolicy {
                    policy: Box::new(GroupFraction::new(groups.clone(), *fractions)?),
                    groups: Some(groups),
                    weights: None,
                }
            }
            PolicySpec::GroupWeightedStratified {
                grouping,
                scores,
                mapping,
                epsilon,
            } => {
                let stats = stats.ok_or_else(|| {
                    config_error(
                        "corpus_stats_missing",
                        "group-weighted selection needs corpus statistics",
                    )
                })?;
                let groups = grouping.resolve(scores)?;
                for category in stats.ungrouped(&groups) {
                    warn!(%category, "category belongs to no performance group and keeps no cells");
                }
                let weights = GroupWeights::from_corpus(stats, &groups, scores, *mapping, *epsilon)?;
                BuiltPolicy {
                    policy: Box::new(GroupWeightedStratified::new(groups.clone(), weights)),
                    groups: Some(groups),
                    weights: Some(weights),
                }
            }
        };
        Ok(built)
    }
}

fn plain(policy: impl SelectionPolicy + 'static) -> BuiltPolicy {
    BuiltPolicy {
        policy: Box::new(policy),
        groups: None,
        weights: None,
    }
}

/// Optional artefacts written alongside the merged tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Write each participating category's reconciled table.
    #[serde(default = "OutputSpec::default_reconciled")]
    pub reconciled: bool,
    /// Write marker-stripped merged tables under `Stripped/`.
    #[serde(default)]
    pub strip: bool,
}

impl OutputSpec {
    fn default_reconciled() -> bool {
        true
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            reconciled: true,
            strip: false,
        }
    }
}

/// Deterministic variant-building run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Corpus location and naming conventions.
    pub corpus: CorpusSpec,
    /// Master seed; every file draws from its own substream.
    pub seed: u64,
    /// Marker token flagging perturbed cells.
    #[serde(default = "Plan::default_sentinel")]
    pub sentinel: String,
    /// Retention target resolved per file.
    #[serde(default)]
    pub target: RetentionTarget,
    /// Selection policy.
    pub policy: PolicySpec,
    /// Output toggles.
    #[serde(default)]
    pub outputs: OutputSpec,
    /// Directory containing the plan on disk (ignored when serializing).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Plan {
    fn default_sentinel() -> String {
        DEFAULT_SENTINEL.to_string()
    }

    /// Returns the deterministic hash associated with the plan contents.
    pub fn plan_hash(&self) -> Result<String, VariantError> {
        stable_hash_string(self)
    }

    /// Produces a YAML representation of the plan.
    pub fn to_yaml_string(&self) -> Result<String, VariantError> {
        to_yaml_string(self)
    }

    /// The configured sentinel.
    pub fn sentinel(&self) -> Sentinel {
        Sentinel::new(self.sentinel.clone())
    }

    /// Returns the resolved corpus root.
    pub fn corpus_root(&self) -> PathBuf {
        if self.corpus.root.is_absolute() {
            self.corpus.root.clone()
        } else {
            self.base_dir.join(&self.corpus.root)
        }
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<(), VariantError> {
        if self.sentinel.is_empty() {
            return Err(config_error("sentinel_empty", "sentinel token must not be empty"));
        }
        if self.corpus.baseline_dir.is_empty() {
            return Err(config_error(
                "baseline_dir_empty",
                "baseline directory name must not be empty",
            ));
        }
        self.target.validate()
    }
}

/// Loads and validates a plan from disk.
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<Plan, VariantError> {
    let plan_path = path.as_ref();
    let bytes = fs::read(plan_path).map_err(|err| {
        VariantError::Io(
            ErrorInfo::new("plan_read", err.to_string())
                .with_context("path", plan_path.display().to_string()),
        )
    })?;
    let mut plan: Plan = from_yaml_slice(&bytes)?;
    plan.corpus.categories.sort();
    plan.corpus.categories.dedup();
    plan.base_dir = plan_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    plan.validate()?;
    Ok(plan)
}

/// Writes a plan as YAML.
pub fn save_plan<P: AsRef<Path>>(plan: &Plan, path: P) -> Result<(), VariantError> {
    let yaml = plan.to_yaml_string()?;
    fs::write(path.as_ref(), yaml).map_err(|err| io_error("plan_write", err))
}
