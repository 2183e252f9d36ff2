//! Sentinel scan producing the perturbed cells of a table.

use tabvar_core::{CellCoord, PerturbedCellSet, Sentinel, Table};

/// Returns every coordinate of `table` whose value starts with the sentinel.
///
/// Rows are enumerated in sequence order and columns in table order, both
/// 1-based. The table type guarantees one column order for every row.
pub fn scan(table: &Table, sentinel: &Sentinel) -> PerturbedCellSet {
    table
        .rows()
        .iter()
        .enumerate()
        .flat_map(|(row_offset, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, value)| sentinel.marks(value))
                .map(move |(col_offset, _)| CellCoord::from_offsets(row_offset, col_offset))
        })
        .collect()
}
