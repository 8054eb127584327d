//! Prompt-to-field mapping against a [`RuleContext`].

use rulewright_core::{extract_phrases, rank_fields, FieldMapping, MappingThresholds};
use serde::Serialize;

use crate::context::RuleContext;
use crate::embedder::Embedder;
use crate::orchestrator::Stage;
use crate::providers::ProviderError;

/// Phrases extracted from a prompt and the fields they map to.
#[derive(Debug, Clone)]
pub struct PromptMapping {
    pub phrases: Vec<String>,
    pub mapping: FieldMapping,
}

/// Serializable view of a [`PromptMapping`] with its gate outcome.
#[derive(Debug, Clone, Serialize)]
pub struct MappingReport {
    pub phrases: Vec<String>,
    pub key_mappings: Vec<rulewright_core::PhraseMapping>,
    pub max_similarity: f32,
    pub candidate_keys: Vec<String>,
    pub confidence_score: f32,
    pub passes_gate: bool,
}

impl PromptMapping {
    pub fn report(&self, thresholds: &MappingThresholds) -> MappingReport {
        MappingReport {
            phrases: self.phrases.clone(),
            key_mappings: self.mapping.mappings.clone(),
            max_similarity: self.mapping.max_similarity,
            candidate_keys: self.mapping.candidate_fields.clone(),
            confidence_score: self.mapping.confidence(thresholds.confidence_window),
            passes_gate: self.mapping.gate(thresholds).is_ok(),
        }
    }
}

/// Extract phrases from `prompt`, embed them and rank catalog fields.
///
/// The gate is not applied here.
pub async fn map_prompt(
    prompt: &str,
    context: &RuleContext,
    embedder: &Embedder,
    thresholds: &MappingThresholds,
) -> Result<PromptMapping, ProviderError> {
    let phrases = extract_phrases(prompt);
    tracing::debug!(
        stage = ?Stage::Embedding,
        phrases = phrases.len(),
        "extracted phrases"
    );

    let phrase_embeddings = embedder.embed(&phrases).await?;
    context.check_request_vectors("phrase", &phrase_embeddings)?;

    let mapping = rank_fields(
        &phrases,
        &phrase_embeddings,
        context.catalog(),
        context.field_embeddings(),
        thresholds,
    );

    Ok(PromptMapping { phrases, mapping })
}
