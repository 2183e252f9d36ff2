//! Interchangeable strategies deciding which perturbed cells survive.
//!
//! Every strategy sees categories in name order and coordinates in
//! row-major order before it touches the RNG, so a fixed seed reproduces
//! the same decision.

use tabvar_core::{RngHandle, VariantError};

use crate::decision::{FileCells, SelectionDecision};

mod group_fraction;
mod group_stratified;
mod group_weighted;
mod pass_through;
mod rank_weighted;
mod structural;
mod uniform;

pub use group_fraction::{GroupFraction, GroupFractions};
pub use group_stratified::GroupStratifiedTwoStep;
pub use group_weighted::GroupWeightedStratified;
pub use pass_through::PassThrough;
pub use rank_weighted::{rank_weights, RankWeighted};
pub use structural::{StructuralExclusivity, DEFAULT_COLUMN_BUDGET};
pub use uniform::UniformTwoStep;

/// Chooses which perturbed coordinates of one file to keep.
pub trait SelectionPolicy: Send + Sync {
    /// Stable identifier recorded in summaries.
    fn name(&self) -> &'static str;

    /// Returns true when the policy reads the per-file retention target.
    fn uses_target(&self) -> bool {
        false
    }

    /// Selects the kept coordinates for one file.
    fn select(
        &self,
        cells: &FileCells,
        target: usize,
        rng: &mut RngHandle,
    ) -> Result<SelectionDecision, VariantError>;
}
