//! Structured error types shared across tabvar crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`VariantError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (file ids, categories, sizes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for variant construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum VariantError {
    /// Rows or tables disagree on their column list or column order.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(ErrorInfo),
    /// A variant does not have the row count of its baseline.
    #[error("row count mismatch: {0}")]
    RowCount(ErrorInfo),
    /// Selection policy configuration or execution errors.
    #[error("selection error: {0}")]
    Selection(ErrorInfo),
    /// Reconciliation errors (coordinates out of range, etc.).
    #[error("reconcile error: {0}")]
    Reconcile(ErrorInfo),
    /// Invalid run plan or command line configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Filesystem errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl VariantError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            VariantError::SchemaMismatch(info)
            | VariantError::RowCount(info)
            | VariantError::Selection(info)
            | VariantError::Reconcile(info)
            | VariantError::Config(info)
            | VariantError::Io(info)
            | VariantError::Serde(info) => info,
        }
    }

    /// Returns true for errors that only disqualify a single category of a file.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            VariantError::SchemaMismatch(_) | VariantError::RowCount(_)
        )
    }
}
