use tabvar_core::{RngHandle, VariantError};

use super::uniform::draw_two_step;
use super::SelectionPolicy;
use crate::decision::{total_cells, FileCells, SelectionDecision};
use crate::groups::{PerformanceGroup, PerformanceGroups};

/// Runs the two-step uniform draw inside each performance group on its own,
/// keeping `max(1, max(counts in group))` cells per group.
///
/// The file-level target only decides whether everything is kept: when it
/// covers every perturbed cell of the file no draw happens. Otherwise each
/// group sets its own target.
#[derive(Debug, Clone)]
pub struct GroupStratifiedTwoStep {
    groups: PerformanceGroups,
}

impl GroupStratifiedTwoStep {
    /// Creates the policy for a group assignment.
    pub fn new(groups: PerformanceGroups) -> Self {
        Self { groups }
    }
}

impl SelectionPolicy for GroupStratifiedTwoStep {
    fn name(&self) -> &'static str {
        "group-stratified-two-step"
    }

    fn uses_target(&self) -> bool {
        true
    }

    fn select(
        &self,
        cells: &FileCells,
        target: usize,
        rng: &mut RngHandle,
    ) -> Result<SelectionDecision, VariantError> {
        if target >= total_cells(cells) {
            return Ok(SelectionDecision::keep_all(cells));
        }
        let mut decision = SelectionDecision::for_categories(cells);
        for group in PerformanceGroup::ALL {
            let members: Vec<_> = cells
                .iter()
                .filter(|(category, set)| {
                    !set.is_empty() && self.groups.group_of(category) == Some(group)
                })
                .collect();
            if members.is_empty() {
                continue;
            }
            let group_target = members
                .iter()
                .map(|(_, set)| set.len())
                .max()
                .unwrap_or(0)
                .max(1);
            let available: usize = members.iter().map(|(_, set)| set.len()).sum();
            if group_target >= available {
                for (category, set) in &members {
                    for coord in set.iter() {
                        decision.keep(category, *coord);
                    }
                }
                continue;
            }
            let pools = members
                .iter()
                .map(|(category, set)| ((*category).clone(), set.as_slice().to_vec()))
                .collect();
            draw_two_step(pools, group_target, rng, &mut decision);
        }
        Ok(decision)
    }
}
