//! Static reference documents loaded once per process

use serde_json::{Map, Value};
use std::path::Path;

use gradchat_core::{Category, Error, Result};

/// Category reference entries plus the general information block
#[derive(Debug, Clone, Default)]
pub struct ReferenceContext {
    categories: Map<String, Value>,
    general_info: String,
}

impl ReferenceContext {
    pub fn new(categories: Map<String, Value>, general_info: impl Into<String>) -> Self {
        Self {
            categories,
            general_info: general_info.into(),
        }
    }

    /// Parse the category JSON, which must be an object keyed by category label
    pub fn from_parts(context_json: &str, general_info: impl Into<String>) -> Result<Self> {
        let value: Value = serde_json::from_str(context_json)?;
        let Value::Object(categories) = value else {
            return Err(Error::Configuration(
                "context JSON must be an object keyed by category".to_string(),
            ));
        };

        Ok(Self::new(categories, general_info))
    }

    /// Load `context.json` and `general_info.txt`
    pub fn load(context_path: impl AsRef<Path>, general_info_path: impl AsRef<Path>) -> Result<Self> {
        let context_path = context_path.as_ref();
        let context_json = std::fs::read_to_string(context_path).map_err(|e| {
            Error::Configuration(format!("Error reading {}: {}", context_path.display(), e))
        })?;

        let general_info_path = general_info_path.as_ref();
        let general_info = std::fs::read_to_string(general_info_path).map_err(|e| {
            Error::Configuration(format!("Error reading {}: {}", general_info_path.display(), e))
        })?;

        Self::from_parts(&context_json, general_info).map_err(|e| {
            Error::Configuration(format!("{}: {}", context_path.display(), e))
        })
    }

    /// Reference entries for the given categories, skipping ones without data
    pub fn entries_for(&self, categories: &[Category]) -> Map<String, Value> {
        let mut entries = Map::new();
        for category in categories {
            if let Some(value) = self.categories.get(category.label()) {
                entries.insert(category.label().to_string(), value.clone());
            }
        }
        entries
    }

    pub fn general_info(&self) -> &str {
        &self.general_info
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}
