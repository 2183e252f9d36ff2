use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tabvar_core::{Category, ErrorInfo, Table, VariantError};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::plan::CorpusSpec;

fn io_error(code: &str, path: &Path, err: impl ToString) -> VariantError {
    VariantError::Io(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// A category and the directory its variants live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDir {
    /// Category label.
    pub category: Category,
    /// Directory holding `<file_id><suffix>.json` variants.
    pub dir: PathBuf,
}

/// Discovered corpus: one baseline directory and one directory per category.
#[derive(Debug, Clone)]
pub struct CorpusLayout {
    baseline_dir: PathBuf,
    variant_suffix: String,
    categories: Vec<CategoryDir>,
}

impl CorpusLayout {
    /// Scans `root` for the baseline directory and the category directories.
    ///
    /// Every sub-directory other than the baseline directory is a category;
    /// the configured category suffix is stripped from its name.
    pub fn discover(corpus: &CorpusSpec, root: &Path) -> Result<Self, VariantError> {
        let baseline_dir = root.join(&corpus.baseline_dir);
        if !baseline_dir.is_dir() {
            return Err(VariantError::Config(
                ErrorInfo::new("baseline_dir_missing", "baseline directory not found")
                    .with_context("path", baseline_dir.display().to_string())
                    .with_hint("set corpus.baseline_dir in the plan"),
            ));
        }
        let mut categories = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| io_error("corpus_walk", root, err))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == corpus.baseline_dir {
                continue;
            }
            let label = match &corpus.category_suffix {
                Some(suffix) => name.strip_suffix(suffix.as_str()).unwrap_or(&name),
                None => name.as_str(),
            };
            let category = Category::new(label);
            if !corpus.categories.is_empty() && !corpus.categories.contains(&category) {
                debug!(%category, "category not selected by the plan");
                continue;
            }
            categories.push(CategoryDir {
                category,
                dir: entry.into_path(),
            });
        }
        categories.sort_by(|a, b| a.category.cmp(&b.category));
        for pair in categories.windows(2) {
            if pair[0].category == pair[1].category {
                return Err(VariantError::Config(
                    ErrorInfo::new(
                        "category_duplicate",
                        "two directories map to the same category",
                    )
                    .with_context("category", pair[0].category.as_str()),
                ));
            }
        }
        Ok(Self {
            baseline_dir,
            variant_suffix: corpus.variant_suffix.clone(),
            categories,
        })
    }

    /// Categories in name order.
    pub fn categories(&self) -> &[CategoryDir] {
        &self.categories
    }

    /// File ids: stems of the baseline `.json` files, sorted.
    pub fn file_ids(&self) -> Result<Vec<String>, VariantError> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.baseline_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| io_error("baseline_walk", &self.baseline_dir, err))?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some("json")
            {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        Ok(ids)
    }

    /// Path of the baseline table for `file_id`.
    pub fn baseline_path(&self, file_id: &str) -> PathBuf {
        self.baseline_dir.join(format!("{file_id}.json"))
    }

    /// Path of the variant of `file_id` inside a category directory.
    pub fn variant_path(&self, category: &CategoryDir, file_id: &str) -> PathBuf {
        category
            .dir
            .join(format!("{file_id}{}.json", self.variant_suffix))
    }

    /// Loads the baseline and every compatible variant of one file.
    ///
    /// Unreadable, unparsable or structurally incompatible variants are
    /// skipped and recorded; only a broken baseline fails the file.
    pub fn load_file(&self, file_id: &str) -> Result<FileInputs, VariantError> {
        let baseline = read_table(&self.baseline_path(file_id))?;
        let mut variants = BTreeMap::new();
        let mut skipped = Vec::new();
        for category_dir in &self.categories {
            let path = self.variant_path(category_dir, file_id);
            if !path.is_file() {
                continue;
            }
            let checked = read_table(&path).and_then(|variant| {
                baseline.ensure_same_columns(&variant)?;
                if variant.len() != baseline.len() {
                    return Err(VariantError::RowCount(
                        ErrorInfo::new("row_count", "variant row count differs from the baseline")
                            .with_context("expected", baseline.len().to_string())
                            .with_context("found", variant.len().to_string()),
                    ));
                }
                Ok(variant)
            });
            match checked {
                Ok(variant) => {
                    variants.insert(category_dir.category.clone(), variant);
                }
                Err(err) => {
                    let incompatible = err.is_structural();
                    if incompatible {
                        warn!(file_id, category = %category_dir.category, error = %err, "variant does not fit the baseline, skipping");
                    } else {
                        warn!(file_id, category = %category_dir.category, error = %err, "variant unreadable, skipping");
                    }
                    skipped.push(SkippedCategory {
                        category: category_dir.category.clone(),
                        code: err.info().code.clone(),
                        reason: err.to_string(),
                        incompatible,
                    });
                }
            }
        }
        Ok(FileInputs {
            file_id: file_id.to_string(),
            baseline,
            variants,
            skipped,
        })
    }
}

/// A category left out of one file, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCategory {
    /// Category that was skipped.
    pub category: Category,
    /// Stable error code.
    pub code: String,
    /// Rendered error.
    pub reason: String,
    /// True when the variant parsed but its columns or row count differ
    /// from the baseline; false when it could not be read at all.
    pub incompatible: bool,
}

/// Inputs of one file: its baseline and the usable variants.
#[derive(Debug, Clone)]
pub struct FileInputs {
    /// File id.
    pub file_id: String,
    /// Baseline table.
    pub baseline: Table,
    /// Compatible variants by category.
    pub variants: BTreeMap<Category, Table>,
    /// Variants that could not be used.
    pub skipped: Vec<SkippedCategory>,
}

/// Reads one JSON table from disk.
pub fn read_table(path: &Path) -> Result<Table, VariantError> {
    let bytes = fs::read(path).map_err(|err| io_error("table_read", path, err))?;
    Table::from_json_slice(&bytes).map_err(|err| {
        let mut info = err.info().clone();
        info.context
            .insert("path".to_string(), path.display().to_string());
        match err {
            VariantError::SchemaMismatch(_) => VariantError::SchemaMismatch(info),
            _ => VariantError::Serde(info),
        }
    })
}
