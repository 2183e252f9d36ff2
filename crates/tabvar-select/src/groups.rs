//! Performance groups and the group probability masses derived from them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tabvar_core::{Category, ErrorInfo, VariantError};

use crate::corpus::CorpusStats;

/// Externally supplied performance score per category.
pub type CategoryScores = BTreeMap<Category, f64>;

/// Default floor applied to any group with non-zero corpus volume.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Partition label for a category's detector performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceGroup {
    /// Categories detectors struggle with.
    Under,
    /// Categories with middling detection scores.
    Mid,
    /// Categories detectors handle well.
    Over,
}

impl PerformanceGroup {
    /// Every group, in draw-threshold order.
    pub const ALL: [PerformanceGroup; 3] = [
        PerformanceGroup::Under,
        PerformanceGroup::Mid,
        PerformanceGroup::Over,
    ];

    /// Position of the group in [`PerformanceGroup::ALL`].
    pub fn index(self) -> usize {
        match self {
            PerformanceGroup::Under => 0,
            PerformanceGroup::Mid => 1,
            PerformanceGroup::Over => 2,
        }
    }
}

/// Assignment of categories to the three performance groups.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerformanceGroups {
    /// Under-performing categories.
    #[serde(default)]
    pub under: BTreeSet<Category>,
    /// Mid-performing categories.
    #[serde(default)]
    pub mid: BTreeSet<Category>,
    /// Over-performing categories.
    #[serde(default)]
    pub over: BTreeSet<Category>,
}

impl PerformanceGroups {
    /// Members of `group`.
    pub fn members(&self, group: PerformanceGroup) -> &BTreeSet<Category> {
        match group {
            PerformanceGroup::Under => &self.under,
            PerformanceGroup::Mid => &self.mid,
            PerformanceGroup::Over => &self.over,
        }
    }

    /// The group containing `category`, if any.
    pub fn group_of(&self, category: &Category) -> Option<PerformanceGroup> {
        PerformanceGroup::ALL
            .into_iter()
            .find(|group| self.members(*group).contains(category))
    }

    /// Rejects categories listed in more than one group.
    pub fn validate(&self) -> Result<(), VariantError> {
        let mut seen = BTreeSet::new();
        for group in PerformanceGroup::ALL {
            for category in self.members(group) {
                if !seen.insert(category) {
                    return Err(VariantError::Config(
                        ErrorInfo::new(
                            "group_overlap",
                            "category is assigned to more than one performance group",
                        )
                        .with_context("category", category.as_str()),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Splits categories by score percentiles: scores at or above the
    /// `high_percentile` go to `over`, at or above `low_percentile` to `mid`,
    /// the rest to `under`. Percentiles interpolate linearly between ranks.
    pub fn from_percentiles(
        scores: &CategoryScores,
        high_percentile: f64,
        low_percentile: f64,
    ) -> Result<Self, VariantError> {
        for percentile in [high_percentile, low_percentile] {
            if !(0.0..=100.0).contains(&percentile) {
                return Err(VariantError::Config(
                    ErrorInfo::new("percentile_range", "percentiles must lie in [0, 100]")
                        .with_context("percentile", percentile.to_string()),
                ));
            }
        }
        for (category, score) in scores {
            check_score(category, *score)?;
        }
        let mut values: Vec<f64> = scores.values().copied().collect();
        values.sort_by(f64::total_cmp);
        let mut groups = Self::default();
        if values.is_empty() {
            return Ok(groups);
        }
        let high = percentile(&values, high_percentile);
        let low = percentile(&values, low_percentile);
        for (category, score) in scores {
            let bucket = if *score >= high {
                &mut groups.over
            } else if *score >= low {
                &mut groups.mid
            } else {
                &mut groups.under
            };
            bucket.insert(category.clone());
        }
        Ok(groups)
    }
}

fn check_score(category: &Category, score: f64) -> Result<(), VariantError> {
    if score.is_finite() && score >= 0.0 {
        return Ok(());
    }
    Err(VariantError::Config(
        ErrorInfo::new("score_invalid", "scores must be finite and >= 0")
            .with_context("category", category.as_str())
            .with_context("score", score.to_string()),
    ))
}

fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let position = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// How a performance score turns into sampling mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreMapping {
    /// Mass proportional to score times corpus volume.
    #[default]
    Direct,
    /// Direct probabilities inverted so low-scoring groups are drawn more often.
    Inverted,
}

/// Probability of drawing each performance group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupWeights {
    /// Probability of drawing the under-performing group.
    pub under: f64,
    /// Probability of drawing the mid-performing group.
    pub mid: f64,
    /// Probability of drawing the over-performing group.
    pub over: f64,
}

impl GroupWeights {
    /// Equal mass on every group.
    pub fn uniform() -> Self {
        Self::from_array([1.0 / 3.0; 3])
    }

    fn from_array(values: [f64; 3]) -> Self {
        Self {
            under: values[0],
            mid: values[1],
            over: values[2],
        }
    }

    fn as_array(&self) -> [f64; 3] {
        [self.under, self.mid, self.over]
    }

    /// Probability of drawing `group`.
    pub fn probability(&self, group: PerformanceGroup) -> f64 {
        self.as_array()[group.index()]
    }

    /// Maps a uniform draw in `[0, 1)` onto a group via cumulative thresholds.
    pub fn pick(&self, draw: f64) -> PerformanceGroup {
        if draw < self.under {
            PerformanceGroup::Under
        } else if draw < self.under + self.mid {
            PerformanceGroup::Mid
        } else {
            PerformanceGroup::Over
        }
    }

    /// Normalises raw group masses and floors every group with non-zero
    /// volume at `epsilon`. Floored groups hold exactly `epsilon`; the
    /// remaining mass is shared by the other groups in proportion.
    pub fn from_masses(masses: [f64; 3], volumes: [u64; 3], epsilon: f64) -> Self {
        let grand_total: f64 = masses.iter().sum();
        if grand_total <= 0.0 {
            return Self::uniform();
        }
        let normalised = masses.map(|mass| mass / grand_total);
        Self::from_array(apply_floor(normalised, volumes, epsilon))
    }

    /// Inverts the probabilities of groups with non-zero volume (`w = 1/p`),
    /// renormalises, then floors again.
    pub fn inverted(&self, volumes: [u64; 3], epsilon: f64) -> Self {
        let inverse = self
            .as_array()
            .map(|p| if p > 0.0 { 1.0 / p } else { 0.0 });
        let mut masked = [0.0; 3];
        for index in 0..3 {
            if volumes[index] > 0 {
                masked[index] = inverse[index];
            }
        }
        let total: f64 = masked.iter().sum();
        if total <= 0.0 {
            return *self;
        }
        Self::from_array(apply_floor(masked.map(|w| w / total), volumes, epsilon))
    }

    /// Derives the weights from corpus volumes and category scores.
    pub fn from_corpus(
        stats: &CorpusStats,
        groups: &PerformanceGroups,
        scores: &CategoryScores,
        mapping: ScoreMapping,
        epsilon: f64,
    ) -> Result<Self, VariantError> {
        if !(epsilon > 0.0 && epsilon < 1.0 / 3.0) {
            return Err(VariantError::Config(
                ErrorInfo::new("epsilon_range", "epsilon must lie in (0, 1/3)")
                    .with_context("epsilon", epsilon.to_string()),
            ));
        }
        let mut masses = [0.0; 3];
        let mut volumes = [0u64; 3];
        for group in PerformanceGroup::ALL {
            for category in groups.members(group) {
                let volume = stats.total(category);
                let score = match scores.get(category) {
                    Some(score) => {
                        check_score(category, *score)?;
                        *score
                    }
                    None if volume == 0 => 0.0,
                    None => {
                        return Err(VariantError::Config(
                            ErrorInfo::new("score_missing", "grouped category has no score")
                                .with_context("category", category.as_str())
                                .with_hint("add the category to the policy scores"),
                        ))
                    }
                };
                masses[group.index()] += score * volume as f64;
                volumes[group.index()] += volume;
            }
        }
        let direct = Self::from_masses(masses, volumes, epsilon);
        Ok(match mapping {
            ScoreMapping::Direct => direct,
            ScoreMapping::Inverted => direct.inverted(volumes, epsilon),
        })
    }
}

fn apply_floor(probabilities: [f64; 3], volumes: [u64; 3], epsilon: f64) -> [f64; 3] {
    let floored: [bool; 3] =
        std::array::from_fn(|index| volumes[index] > 0 && probabilities[index] < epsilon);
    let floored_count = floored.iter().filter(|flag| **flag).count();
    if floored_count == 0 {
        return probabilities;
    }
    let free_mass: f64 = (0..3)
        .filter(|index| !floored[*index])
        .map(|index| probabilities[index])
        .sum();
    let budget = 1.0 - epsilon * floored_count as f64;
    std::array::from_fn(|index| {
        if floored[index] {
            epsilon
        } else if free_mass > 0.0 {
            probabilities[index] / free_mass * budget
        } else {
            0.0
        }
    })
}
