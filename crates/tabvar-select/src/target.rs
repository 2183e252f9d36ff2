//! Per-file retention targets.

use serde::{Deserialize, Serialize};
use tabvar_core::{ErrorInfo, VariantError};

/// How many perturbed cells a file should keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum RetentionTarget {
    /// Fixed count per file.
    Absolute(usize),
    /// `max(1, max(counts))`: as many as the busiest category perturbed.
    #[default]
    MaxCategory,
    /// `max(1, floor(alpha * total))` over all categories of the file.
    FractionOfTotal(f64),
    /// `ceil(rows * fraction)` of the baseline row count.
    FractionOfRows(f64),
}

impl RetentionTarget {
    /// Checks fractions lie in `[0, 1]`.
    pub fn validate(&self) -> Result<(), VariantError> {
        match self {
            RetentionTarget::FractionOfTotal(fraction) | RetentionTarget::FractionOfRows(fraction)
                if !(0.0..=1.0).contains(fraction) =>
            {
                Err(VariantError::Config(
                    ErrorInfo::new("target_fraction", "retention fraction must lie in [0, 1]")
                        .with_context("fraction", fraction.to_string()),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Resolves the target for a file with the given per-category counts.
    pub fn resolve(&self, counts: &[usize], baseline_rows: usize) -> usize {
        match self {
            RetentionTarget::Absolute(count) => *count,
            RetentionTarget::MaxCategory => counts.iter().copied().max().unwrap_or(0).max(1),
            RetentionTarget::FractionOfTotal(alpha) => {
                let total: usize = counts.iter().sum();
                ((alpha * total as f64).floor() as usize).max(1)
            }
            RetentionTarget::FractionOfRows(fraction) => {
                (baseline_rows as f64 * fraction).ceil() as usize
            }
        }
    }
}
