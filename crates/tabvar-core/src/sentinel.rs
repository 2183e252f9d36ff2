//! The marker token that flags a perturbed cell value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token used by the perturbation tooling when none is configured.
pub const DEFAULT_SENTINEL: &str = "@@@_";

/// Fixed string prefix marking a value as changed from the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sentinel(String);

impl Sentinel {
    /// Creates a sentinel from an explicit token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn token(&self) -> &str {
        &self.0
    }

    /// True when `value` is a string starting with the token (a perturbed cell).
    pub fn marks(&self, value: &Value) -> bool {
        matches!(value, Value::String(text) if text.starts_with(self.token()))
    }

    /// True when the token occurs anywhere inside `value`, recursing into
    /// arrays and objects. Used to decide whether a merged row is anomalous.
    pub fn occurs_in(&self, value: &Value) -> bool {
        match value {
            Value::String(text) => text.contains(self.token()),
            Value::Array(items) => items.iter().any(|item| self.occurs_in(item)),
            Value::Object(map) => map.values().any(|item| self.occurs_in(item)),
            _ => false,
        }
    }

    /// Returns the text after the marker when `value` is a perturbed cell.
    pub fn strip<'a>(&self, value: &'a Value) -> Option<&'a str> {
        match value {
            Value::String(text) => text.strip_prefix(self.token()),
            _ => None,
        }
    }
}

impl Default for Sentinel {
    fn default() -> Self {
        Self(DEFAULT_SENTINEL.to_string())
    }
}
