//! Field catalog parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_catalog_schema;

/// The catalog compiled into the crate.
const BUILTIN_CATALOG_YAML: &str = include_str!("../../catalogs/credit_fields.yaml");

/// Errors that can occur when loading a field catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Catalog does not match schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Catalog validation failed: {0}")]
    ValidationError(String),
}

/// One data field a rule may reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Human-readable name ("Bureau Score")
    pub label: String,

    /// Identifier used under `var` in JSON Logic ("bureau_score")
    pub value: String,

    /// Grouping used in prompts and listings ("Bureau")
    pub group: String,
}

impl FieldDescriptor {
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            group: group.into(),
        }
    }

    /// Text submitted to the embedding model for this field.
    pub fn embedding_text(&self) -> String {
        format!("{} ({}) in group {}", self.label, self.value, self.group)
    }
}

/// An ordered, validated set of fields.
///
/// Order matters: similarity ties are broken by catalog position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCatalog {
    pub catalog_version: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    fields: Vec<FieldDescriptor>,
}

impl FieldCatalog {
    /// The credit catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG_YAML)
    }

    /// Build a catalog from descriptors, applying the same checks as file loading.
    pub fn from_fields(
        name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            catalog_version: "1.0".to_string(),
            name: name.into(),
            description: None,
            fields,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a catalog file, choosing the format from its extension.
    ///
    /// `.json` is read as JSON; anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, CatalogError> {
        validate_catalog_schema(&value).map_err(CatalogError::SchemaViolation)?;
        let catalog: FieldCatalog = serde_json::from_value(value)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.fields.is_empty() {
            return Err(CatalogError::ValidationError(
                "catalog must contain at least one field".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.label.trim().is_empty() || field.value.trim().is_empty() {
                return Err(CatalogError::ValidationError(format!(
                    "field '{}' has an empty label or value",
                    field.value
                )));
            }
            if !seen.insert(field.value.as_str()) {
                return Err(CatalogError::ValidationError(format!(
                    "Duplicate field value: {}",
                    field.value
                )));
            }
        }

        Ok(())
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    /// Whether `value` is one of the catalog's field identifiers.
    pub fn contains(&self, value: &str) -> bool {
        self.fields.iter().any(|f| f.value == value)
    }

    /// Field identifiers in catalog order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.value.as_str())
    }

    /// Embedding inputs, index-aligned with [`fields`](Self::fields).
    pub fn embedding_texts(&self) -> Vec<String> {
        self.fields.iter().map(FieldDescriptor::embedding_text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CATALOG: &str = r#"
catalog_version: "1.0"
name: "Test Catalog"
fields:
  - label: "Bureau Score"
    value: "bureau_score"
    group: "Bureau"
  - label: "Overdue Amount"
    value: "overdue_amount"
    group: "Bureau"
"#;

    #[test]
    fn test_parse_valid_catalog() {
        let catalog = FieldCatalog::from_yaml(VALID_CATALOG).unwrap();
        assert_eq!(catalog.name, "Test Catalog");
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("overdue_amount"));
        assert!(!catalog.contains("Overdue Amount"));
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = FieldCatalog::builtin().unwrap();
        assert!(catalog.contains("bureau_score"));
        assert!(catalog.contains("foir"));
        assert_eq!(catalog.embedding_texts().len(), catalog.len());
    }

    #[test]
    fn test_embedding_text_format() {
        let field = FieldDescriptor::new("Bureau Score", "bureau_score", "Bureau");
        assert_eq!(field.embedding_text(), "Bureau Score (bureau_score) in group Bureau");
    }

    #[test]
    fn test_duplicate_values_rejected() {
        let yaml = r#"
catalog_version: "1.0"
name: "Dupes"
fields:
  - label: "Bureau Score"
    value: "bureau_score"
    group: "Bureau"
  - label: "CIBIL Score"
    value: "bureau_score"
    group: "Bureau"
"#;
        let result = FieldCatalog::from_yaml(yaml);
        assert!(matches!(result, Err(CatalogError::ValidationError(_))));
    }

    #[test]
    fn test_schema_violation_reported() {
        let yaml = r#"
catalog_version: "1.0"
name: "Bad"
fields:
  - label: "Bureau Score"
    group: "Bureau"
"#;
        let result = FieldCatalog::from_yaml(yaml);
        assert!(matches!(result, Err(CatalogError::SchemaViolation(_))));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "catalog_version": "2.1",
            "name": "Json Catalog",
            "fields": [{"label": "FOIR", "value": "foir", "group": "Income"}]
        }"#;
        let catalog = FieldCatalog::from_json(json).unwrap();
        assert_eq!(catalog.values().collect::<Vec<_>>(), vec!["foir"]);
    }

    #[test]
    fn test_from_fields_requires_fields() {
        let result = FieldCatalog::from_fields("Empty", vec![]);
        assert!(result.is_err());
    }
}
