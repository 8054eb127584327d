//! Pipeline error taxonomy.

use rulewright_core::{CatalogError, MappingRejection};
use thiserror::Error;

use crate::context::ContextError;
use crate::output::OutputParseError;
use crate::providers::ProviderError;

/// Everything a rule generation request can fail with.
///
/// Only [`RuleError::Mapping`] is the caller's to fix (rephrase the
/// prompt). The rest are service-side failures.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("{0}")]
    Mapping(#[from] MappingRejection),

    #[error("Upstream model call failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Could not parse generated rule: {0}")]
    Parse(#[from] OutputParseError),

    #[error("Rule context unavailable: {0}")]
    Context(#[from] ContextError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Pipeline not configured: {0}")]
    NotConfigured(String),
}

impl RuleError {
    /// Whether the request itself was at fault rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RuleError::Mapping(_))
    }

    /// The structured rejection, if this is a mapping failure.
    pub fn rejection(&self) -> Option<&MappingRejection> {
        match self {
            RuleError::Mapping(rejection) => Some(rejection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulewright_core::{FieldMapping, MappingThresholds};

    fn rejection() -> MappingRejection {
        let mapping = FieldMapping {
            mappings: vec![],
            max_similarity: 0.0,
            candidate_fields: vec![],
        };
        mapping.gate(&MappingThresholds::default()).unwrap_err()
    }

    #[test]
    fn test_classification() {
        let mapping = RuleError::from(rejection());
        assert!(mapping.is_client_error());
        assert!(mapping.rejection().is_some());

        let upstream = RuleError::from(ProviderError::AuthError);
        assert!(!upstream.is_client_error());
        assert!(upstream.rejection().is_none());

        let parse = RuleError::from(OutputParseError::NotAnObject { found: "a number" });
        assert!(!parse.is_client_error());
    }

    #[test]
    fn test_mapping_message_is_user_facing() {
        let err = RuleError::from(rejection());
        assert_eq!(
            err.to_string(),
            "Prompt concepts do not map cleanly to available fields."
        );
    }
}
