//! Request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mapping::PhraseMapping;

/// A rule-generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRequest {
    /// Natural-language policy statement
    pub prompt: String,

    /// Extra policy documents considered for this request only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_docs: Option<Vec<String>>,
}

impl RuleRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context_docs: None,
        }
    }

    pub fn with_context_docs(mut self, docs: Vec<String>) -> Self {
        self.context_docs = Some(docs);
        self
    }

    /// Extra documents, empty when none were given.
    pub fn context_docs(&self) -> &[String] {
        self.context_docs.as_deref().unwrap_or_default()
    }
}

/// The parsed output of one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRule {
    /// JSON Logic expression, `Null` if the model omitted it
    pub logic: Value,

    pub explanation: String,

    /// Field identifiers the model says it used
    pub used_fields: Vec<String>,
}

/// A generated rule with its supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResponse {
    #[serde(rename = "json_logic")]
    pub logic: Value,

    pub explanation: String,

    #[serde(rename = "used_keys")]
    pub used_fields: Vec<String>,

    /// Phrase mappings, similarity descending
    #[serde(rename = "key_mappings")]
    pub phrase_mappings: Vec<PhraseMapping>,

    #[serde(rename = "confidence_score")]
    pub confidence: f32,

    #[serde(rename = "retrieved_policy_snippets")]
    pub retrieved_snippets: Vec<String>,

    /// Names the rule uses that are not in the catalog
    #[serde(
        rename = "unrecognized_keys",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub unrecognized_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_context_docs_optional() {
        let req: RuleRequest = serde_json::from_str(r#"{"prompt": "foir above 0.6"}"#).unwrap();
        assert!(req.context_docs().is_empty());

        let req: RuleRequest =
            serde_json::from_str(r#"{"prompt": "x", "context_docs": ["doc"]}"#).unwrap();
        assert_eq!(req.context_docs(), &["doc"]);
    }

    #[test]
    fn test_response_wire_keys() {
        let response = RuleResponse {
            logic: json!({"<": [{"var": "bureau_score"}, 600]}),
            explanation: "Reject low scores.".into(),
            used_fields: vec!["bureau_score".into()],
            phrase_mappings: vec![PhraseMapping {
                phrase: "bureau score below 600".into(),
                mapped_field: "bureau_score".into(),
                similarity: 0.5,
            }],
            confidence: 0.5,
            retrieved_snippets: vec!["Credit Policy v1.0".into()],
            unrecognized_fields: vec![],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["json_logic"]["<"][1], 600);
        assert_eq!(json["used_keys"][0], "bureau_score");
        assert_eq!(json["key_mappings"][0]["mapped_to"], "bureau_score");
        assert_eq!(json["confidence_score"], 0.5);
        assert_eq!(json["retrieved_policy_snippets"].as_array().unwrap().len(), 1);
        assert!(json.get("unrecognized_keys").is_none());
    }

    #[test]
    fn test_unrecognized_keys_serialized_when_present() {
        let response = RuleResponse {
            logic: Value::Null,
            explanation: String::new(),
            used_fields: vec![],
            phrase_mappings: vec![],
            confidence: 0.0,
            retrieved_snippets: vec![],
            unrecognized_fields: vec!["cibil".into()],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["unrecognized_keys"][0], "cibil");
    }
}
