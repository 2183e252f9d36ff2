use serde::{Deserialize, Serialize};
use tabvar_core::{ErrorInfo, RngHandle, VariantError};

use super::SelectionPolicy;
use crate::decision::{FileCells, SelectionDecision};
use crate::groups::{PerformanceGroup, PerformanceGroups};

/// Share of each category's cells kept, per performance group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupFractions {
    /// Fraction kept by under-performing categories.
    pub under: f64,
    /// Fraction kept by mid-performing categories.
    pub mid: f64,
    /// Fraction kept by over-performing categories.
    pub over: f64,
}

impl Default for GroupFractions {
    fn default() -> Self {
        Self {
            under: 0.6,
            mid: 0.3,
            over: 0.1,
        }
    }
}

impl GroupFractions {
    /// Fraction for `group`.
    pub fn of(&self, group: PerformanceGroup) -> f64 {
        match group {
            PerformanceGroup::Under => self.under,
            PerformanceGroup::Mid => self.mid,
            PerformanceGroup::Over => self.over,
        }
    }

    /// Rejects fractions outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), VariantError> {
        for group in PerformanceGroup::ALL {
            let fraction = self.of(group);
            if !(0.0..=1.0).contains(&fraction) {
                return Err(VariantError::Config(
                    ErrorInfo::new("group_fraction", "group fractions must lie in [0, 1]")
                        .with_context("fraction", fraction.to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Keeps `ceil(count * fraction(group))` coordinates of each category as a
/// row-major prefix. Ungrouped categories keep nothing.
#[derive(Debug, Clone)]
pub struct GroupFraction {
    groups: PerformanceGroups,
    fractions: GroupFractions,
}

impl GroupFraction {
    /// Creates the policy, validating the fractions.
    pub fn new(groups: PerformanceGroups, fractions: GroupFractions) -> Result<Self, VariantError> {
        fractions.validate()?;
        Ok(Self { groups, fractions })
    }
}

impl SelectionPolicy for GroupFraction {
    fn name(&self) -> &'static str {
        "group-fraction"
    }

    fn select(
        &self,
        cells: &FileCells,
        _target: usize,
        _rng: &mut RngHandle,
    ) -> Result<SelectionDecision, VariantError> {
        let mut decision = SelectionDecision::for_categories(cells);
        for (category, set) in cells {
            let Some(group) = self.groups.group_of(category) else {
                continue;
            };
            let keep = (set.len() as f64 * self.fractions.of(group)).ceil() as usize;
            for coord in set.iter().take(keep) {
                decision.keep(category, *coord);
            }
        }
        Ok(decision)
    }
}
