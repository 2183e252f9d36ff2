//! Collapsing per-category reconciled tables into one labelled table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tabvar_core::{Category, ErrorInfo, Sentinel, Table, VariantError};
use tracing::debug;

/// Anomaly label of one merged row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLabel {
    /// 0-based position of the row in the merged table.
    pub index: usize,
    /// Categories that produced the row, sorted; empty for clean rows.
    pub categories: Vec<Category>,
}

/// Deduplicated rows of one file with their labels, aligned by position.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedOutput {
    /// Unique rows in first-seen order.
    pub table: Table,
    /// One label per row of `table`.
    pub labels: Vec<RowLabel>,
}

impl MergedOutput {
    /// Number of rows carrying at least one category label.
    pub fn anomalous_rows(&self) -> usize {
        self.labels
            .iter()
            .filter(|label| !label.categories.is_empty())
            .count()
    }

    /// Renders the label list as JSON.
    pub fn labels_json(&self) -> Result<Value, VariantError> {
        serde_json::to_value(&self.labels).map_err(|err| serde_error("labels_encode", err))
    }
}

/// Merges reconciled tables of one file.
///
/// Categories are visited in name order and rows in table order; the first
/// row with a given structural key is kept and every category producing that
/// key is remembered. A row containing the sentinel anywhere is labelled with
/// its sorted categories, any other row with none.
pub fn merge(
    file_id: &str,
    tables: &BTreeMap<Category, Table>,
    sentinel: &Sentinel,
) -> Result<MergedOutput, VariantError> {
    let mut reference: Option<&Table> = None;
    for table in tables.values().filter(|table| !table.columns().is_empty()) {
        match reference {
            Some(first) => first.ensure_same_columns(table)?,
            None => reference = Some(table),
        }
    }
    let mut merged = Table::new(
        reference
            .map(|table| table.columns().to_vec())
            .unwrap_or_default(),
    );

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut sources: Vec<BTreeSet<Category>> = Vec::new();
    for (category, table) in tables {
        for row in table.rows() {
            let key = structural_key(table.columns(), row)?;
            let position = match positions.get(&key) {
                Some(position) => *position,
                None => {
                    merged.push_row(row.clone())?;
                    sources.push(BTreeSet::new());
                    positions.insert(key, sources.len() - 1);
                    sources.len() - 1
                }
            };
            sources[position].insert(category.clone());
        }
    }

    let labels = merged
        .rows()
        .iter()
        .zip(sources)
        .enumerate()
        .map(|(index, (row, categories))| RowLabel {
            index,
            categories: if row.iter().any(|value| sentinel.occurs_in(value)) {
                categories.into_iter().collect()
            } else {
                Vec::new()
            },
        })
        .collect();

    debug!(file_id, rows = merged.len(), "merged variant tables");
    Ok(MergedOutput {
        table: merged,
        labels,
    })
}

/// Canonical JSON of a row object with keys sorted at every depth.
pub fn structural_key(columns: &[String], row: &[Value]) -> Result<String, VariantError> {
    let object = Value::Object(
        columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect(),
    );
    serde_json::to_string(&sorted(object)).map_err(|err| serde_error("row_key", err))
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> =
                map.into_iter().map(|(key, value)| (key, sorted(value))).collect();
            Value::Object(ordered.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

fn serde_error(code: &str, err: serde_json::Error) -> VariantError {
    VariantError::Serde(ErrorInfo::new(code, err.to_string()))
}
