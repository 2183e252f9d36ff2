//! Tables of ordered records sharing one column schema.

use serde_json::{Map, Value};

use crate::coord::CellCoord;
use crate::errors::{ErrorInfo, VariantError};

/// An ordered mapping from column name to value.
pub type Record = Map<String, Value>;

/// Ordered sequence of rows that all share the same column names and order.
///
/// The column contract is checked on construction: a row whose keys differ
/// from the first row, in name or in position, raises
/// [`VariantError::SchemaMismatch`] rather than silently misaddressing cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a table from positional rows, checking every row width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, VariantError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Creates a table from records, taking the column order of the first record.
    pub fn from_records(records: Vec<Record>) -> Result<Self, VariantError> {
        let mut iter = records.into_iter();
        let Some(first) = iter.next() else {
            return Ok(Self::default());
        };
        let columns: Vec<String> = first.keys().cloned().collect();
        let mut rows = Vec::with_capacity(iter.len() + 1);
        rows.push(first.into_iter().map(|(_, value)| value).collect());
        for (offset, record) in iter.enumerate() {
            if record.len() != columns.len()
                || !record.keys().zip(columns.iter()).all(|(a, b)| a == b)
            {
                return Err(VariantError::SchemaMismatch(
                    ErrorInfo::new(
                        "record_columns",
                        "record keys differ from the first record of the table",
                    )
                    .with_context("row", (offset + 2).to_string())
                    .with_context("expected", columns.join(","))
                    .with_context(
                        "found",
                        record.keys().cloned().collect::<Vec<_>>().join(","),
                    ),
                ));
            }
            rows.push(record.into_iter().map(|(_, value)| value).collect());
        }
        Ok(Self { columns, rows })
    }

    /// Parses a JSON document holding an array of row objects, or a single row object.
    pub fn from_json(value: Value) -> Result<Self, VariantError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(map) => vec![Value::Object(map)],
            other => {
                return Err(VariantError::Serde(
                    ErrorInfo::new("table_shape", "expected an array of objects or an object")
                        .with_context("found", json_kind(&other)),
                ))
            }
        };
        let mut records = Vec::with_capacity(items.len());
        for (offset, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(map) => records.push(map),
                other => {
                    return Err(VariantError::Serde(
                        ErrorInfo::new("table_row_shape", "table rows must be JSON objects")
                            .with_context("row", (offset + 1).to_string())
                            .with_context("found", json_kind(&other)),
                    ))
                }
            }
        }
        Self::from_records(records)
    }

    /// Parses a table from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, VariantError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| VariantError::Serde(ErrorInfo::new("table_parse", err.to_string())))?;
        Self::from_json(value)
    }

    /// Renders the table as a JSON array of objects in column order.
    pub fn to_json(&self) -> Value {
        Value::Array(
            (0..self.rows.len())
                .map(|offset| Value::Object(self.record_at(offset)))
                .collect(),
        )
    }

    /// Column names in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row at the 0-based `offset`.
    pub fn row(&self, offset: usize) -> Option<&[Value]> {
        self.rows.get(offset).map(Vec::as_slice)
    }

    fn record_at(&self, offset: usize) -> Record {
        self.columns
            .iter()
            .cloned()
            .zip(self.rows[offset].iter().cloned())
            .collect()
    }

    /// Returns the value stored at `coord`.
    pub fn cell(&self, coord: CellCoord) -> Option<&Value> {
        self.rows
            .get(coord.row_offset())
            .and_then(|row| row.get(coord.col_offset()))
    }

    /// Overwrites the value at `coord`, returning the previous value.
    pub fn set_cell(&mut self, coord: CellCoord, value: Value) -> Result<Value, VariantError> {
        let (rows, cols) = (self.rows.len(), self.columns.len());
        let slot = self
            .rows
            .get_mut(coord.row_offset())
            .and_then(|row| row.get_mut(coord.col_offset()))
            .ok_or_else(|| out_of_range(coord, rows, cols))?;
        Ok(std::mem::replace(slot, value))
    }

    /// Appends a row, checking its width against the column list.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), VariantError> {
        if row.len() != self.columns.len() {
            return Err(VariantError::SchemaMismatch(
                ErrorInfo::new("row_width", "row width differs from the column count")
                    .with_context("row", (self.rows.len() + 1).to_string())
                    .with_context("expected", self.columns.len().to_string())
                    .with_context("found", row.len().to_string()),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Fails with [`VariantError::SchemaMismatch`] unless `other` has the
    /// same columns in the same order. Tables without rows carry no schema
    /// and are compatible with anything.
    pub fn ensure_same_columns(&self, other: &Table) -> Result<(), VariantError> {
        let schemaless = |table: &Table| table.is_empty() && table.columns.is_empty();
        if schemaless(self) || schemaless(other) {
            return Ok(());
        }
        if self.columns != other.columns {
            return Err(VariantError::SchemaMismatch(
                ErrorInfo::new("table_columns", "tables disagree on column names or order")
                    .with_context("expected", self.columns.join(","))
                    .with_context("found", other.columns.join(",")),
            ));
        }
        Ok(())
    }
}

fn out_of_range(coord: CellCoord, rows: usize, cols: usize) -> VariantError {
    VariantError::Reconcile(
        ErrorInfo::new("coord_out_of_range", "coordinate lies outside the table")
            .with_context("coord", coord.to_string())
            .with_context("rows", rows.to_string())
            .with_context("columns", cols.to_string()),
    )
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
