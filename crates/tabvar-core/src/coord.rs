//! Cell coordinates and perturbed-cell sets.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ErrorInfo, VariantError};

/// A 1-based `(row, column)` address inside one table snapshot.
///
/// Coordinates order row-major, which is also the order in which
/// [`PerturbedCellSet`] stores them. They render as `R{row}C{col}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellCoord {
    row: usize,
    col: usize,
}

impl CellCoord {
    /// Creates a coordinate, rejecting zero indices.
    pub fn new(row: usize, col: usize) -> Result<Self, VariantError> {
        if row == 0 || col == 0 {
            return Err(VariantError::Reconcile(
                ErrorInfo::new("coord_zero_index", "cell coordinates are 1-based")
                    .with_context("row", row.to_string())
                    .with_context("col", col.to_string()),
            ));
        }
        Ok(Self { row, col })
    }

    /// Builds a coordinate from 0-based offsets.
    pub fn from_offsets(row_offset: usize, col_offset: usize) -> Self {
        Self {
            row: row_offset + 1,
            col: col_offset + 1,
        }
    }

    /// 1-based row index.
    pub fn row(&self) -> usize {
        self.row
    }

    /// 1-based column index.
    pub fn col(&self) -> usize {
        self.col
    }

    /// 0-based row offset.
    pub fn row_offset(&self) -> usize {
        self.row - 1
    }

    /// 0-based column offset.
    pub fn col_offset(&self) -> usize {
        self.col - 1
    }
}

impl Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}C{}", self.row, self.col)
    }
}

impl FromStr for CellCoord {
    type Err = VariantError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let parse_error = || {
            VariantError::Serde(
                ErrorInfo::new("coord_parse", "expected a coordinate of the form R<row>C<col>")
                    .with_context("input", text),
            )
        };
        let rest = text.trim().strip_prefix('R').ok_or_else(parse_error)?;
        let (row, col) = rest.split_once('C').ok_or_else(parse_error)?;
        let row = row.parse::<usize>().map_err(|_| parse_error())?;
        let col = col.parse::<usize>().map_err(|_| parse_error())?;
        CellCoord::new(row, col).map_err(|_| parse_error())
    }
}

impl Serialize for CellCoord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellCoord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Sorted, duplicate-free set of coordinates carrying the sentinel marker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerturbedCellSet {
    coords: Vec<CellCoord>,
}

impl PerturbedCellSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of perturbed coordinates.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Returns true when no coordinate is perturbed.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Returns true when `coord` is in the set.
    pub fn contains(&self, coord: &CellCoord) -> bool {
        self.coords.binary_search(coord).is_ok()
    }

    /// Coordinates in row-major order.
    pub fn as_slice(&self) -> &[CellCoord] {
        &self.coords
    }

    /// Iterates the coordinates in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, CellCoord> {
        self.coords.iter()
    }
}

impl FromIterator<CellCoord> for PerturbedCellSet {
    fn from_iter<I: IntoIterator<Item = CellCoord>>(iter: I) -> Self {
        let mut coords: Vec<CellCoord> = iter.into_iter().collect();
        coords.sort_unstable();
        coords.dedup();
        Self { coords }
    }
}

impl<'a> IntoIterator for &'a PerturbedCellSet {
    type Item = &'a CellCoord;
    type IntoIter = std::slice::Iter<'a, CellCoord>;

    fn into_iter(self) -> Self::IntoIter {
        self.coords.iter()
    }
}
