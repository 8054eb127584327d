//! JSON Schema validation for field catalogs.
//!
//! Catalog documents are checked against `schemas/field_catalog.schema.json`
//! before they are deserialized, so structural problems are reported with
//! their location instead of as a generic serde error.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded catalog schema (loaded at compile time).
const CATALOG_SCHEMA_JSON: &str = include_str!("../../schemas/field_catalog.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(CATALOG_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a catalog document against the schema.
///
/// Returns every violation found, each formatted as `"<message> at <path>"`.
pub fn validate_catalog_schema(catalog_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(catalog_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> serde_json::Value {
        serde_json::json!({
            "catalog_version": "1.0",
            "name": "Test catalog",
            "fields": [
                { "label": "Bureau Score", "value": "bureau_score", "group": "Bureau" }
            ]
        })
    }

    #[test]
    fn test_minimal_catalog_passes_schema() {
        assert!(validate_catalog_schema(&minimal()).is_ok());
    }

    #[test]
    fn test_missing_fields_array_fails() {
        let value = serde_json::json!({
            "catalog_version": "1.0",
            "name": "Test catalog"
        });
        let errors = validate_catalog_schema(&value).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_empty_fields_array_fails() {
        let mut value = minimal();
        value["fields"] = serde_json::json!([]);
        assert!(validate_catalog_schema(&value).is_err());
    }

    #[test]
    fn test_identifier_pattern_enforced() {
        let mut value = minimal();
        value["fields"][0]["value"] = serde_json::json!("Bureau Score");
        let errors = validate_catalog_schema(&value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("/fields/0/value")));
    }

    #[test]
    fn test_invalid_version_format_fails() {
        let mut value = minimal();
        value["catalog_version"] = serde_json::json!("v1");
        assert!(validate_catalog_schema(&value).is_err());
    }

    #[test]
    fn test_additional_properties_fail() {
        let mut value = minimal();
        value["fields"][0]["description"] = serde_json::json!("not allowed");
        assert!(validate_catalog_schema(&value).is_err());
    }
}
