//! Prompts for the rule generation call.
//!
//! The system prompt is fixed. The user message is rebuilt per request from
//! the catalog, the candidate fields, the retrieved policy snippets and the
//! policy statement itself.

use rulewright_core::FieldCatalog;

/// System prompt for rule generation.
///
/// Frames the model as a rules engineer restricted to catalog fields.
pub const SYSTEM_PROMPT: &str = "You are a credit risk rules engineer. \
You take natural language policy descriptions and convert them into JSON Logic. \
You MUST only use the allowed keys under the 'var' operator.";

/// Task description placed ahead of the per-request blocks.
pub const TASK_PROMPT: &str = r#"You are given:

1) A user prompt describing a credit policy.
2) A list of allowed JSON fields (ALLOWED_FIELDS).
3) A small set of policy snippets (retrieved context).
4) A small set of candidate fields that embeddings think are most relevant.

TASK:

- Produce a JSON object with EXACTLY these top-level keys:
  - "json_logic": a valid JSON Logic rule object
  - "explanation": 1-3 sentences explaining the rule in plain English
  - "used_keys": array of strings of the fields actually used in json_logic

RULES:

- "json_logic" must be valid JSON Logic.
- Use operators like "and", "or", ">", ">=", "<", "<=", "==", "in".
- Under each "var" use ONLY field names from ALLOWED_FIELDS.
- Prefer the candidate fields when relevant, but do not force them if they don't make sense.
- Be deterministic and conservative: do not invent extra conditions."#;

/// Closing instruction restating the output contract.
pub const RESPONSE_INSTRUCTION: &str =
    r#"Now respond ONLY with a JSON object having keys: "json_logic", "explanation", "used_keys"."#;

/// One `- label → value` line per catalog field, in catalog order.
pub fn allowed_fields_block(catalog: &FieldCatalog) -> String {
    catalog
        .fields()
        .iter()
        .map(|f| format!("- {} → {}", f.label, f.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user message for one generation call.
pub fn build_user_prompt(
    prompt: &str,
    catalog: &FieldCatalog,
    candidate_fields: &[String],
    snippets: &[String],
) -> String {
    format!(
        "{}\n\n\
         ALLOWED_FIELDS:\n{}\n\n\
         Candidate fields suggested by embeddings:\n{}\n\n\
         Policy snippets (may influence thresholds and decisions):\n{}\n\n\
         User prompt:\n{}\n\n\
         {}\n",
        TASK_PROMPT,
        allowed_fields_block(catalog),
        pretty_json_list(candidate_fields),
        pretty_json_list(snippets),
        prompt,
        RESPONSE_INSTRUCTION,
    )
}

fn pretty_json_list(items: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
}
