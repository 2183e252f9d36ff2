#![deny(missing_docs)]
#![doc = "Core data model for tabular anomaly variants: tables, cell coordinates, categories, the sentinel marker, errors and the seeding policy."]

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

pub mod coord;
pub mod errors;
pub mod provenance;
pub mod rng;
pub mod sentinel;
pub mod table;

pub use coord::{CellCoord, PerturbedCellSet};
pub use errors::{ErrorInfo, VariantError};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_named_seed, RngHandle};
pub use sentinel::{Sentinel, DEFAULT_SENTINEL};
pub use table::{Record, Table};

/// Label identifying one perturbation source (e.g. `Temporal`, `Security`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Creates a category from its label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the category label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Self(label)
    }
}
