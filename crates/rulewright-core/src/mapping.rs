//! Phrase-to-field mapping and the similarity gate.
//!
//! Given phrase/field similarities this module decides which catalog
//! fields a prompt is talking about, and whether the prompt maps cleanly
//! enough to be worth a generation call at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::FieldCatalog;
use crate::similarity::{top_k_indices, SimilarityMatrix};

pub const DEFAULT_RELAXED_THRESHOLD: f32 = 0.30;
pub const DEFAULT_STRICT_THRESHOLD: f32 = 0.15;
pub const DEFAULT_FIELDS_PER_PHRASE: usize = 3;
pub const DEFAULT_CONFIDENCE_WINDOW: usize = 3;

/// Message returned to the caller when the gate rejects a prompt.
pub const REJECTION_MESSAGE: &str = "Prompt concepts do not map cleanly to available fields.";

/// Diagnostic detail accompanying [`REJECTION_MESSAGE`].
pub const REJECTION_DETAIL: &str =
    "None of the allowed keys matched the prompt with sufficient similarity.";

/// Tunable cut-offs for mapping and gating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappingThresholds {
    /// Minimum similarity for a field to become a generation candidate
    pub relaxed: f32,

    /// Minimum best similarity for the prompt to pass the gate
    pub strict: f32,

    /// Fields recorded per phrase
    pub fields_per_phrase: usize,

    /// Number of top mappings averaged into the confidence score
    pub confidence_window: usize,
}

impl Default for MappingThresholds {
    fn default() -> Self {
        Self {
            relaxed: DEFAULT_RELAXED_THRESHOLD,
            strict: DEFAULT_STRICT_THRESHOLD,
            fields_per_phrase: DEFAULT_FIELDS_PER_PHRASE,
            confidence_window: DEFAULT_CONFIDENCE_WINDOW,
        }
    }
}

/// One phrase matched against one catalog field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseMapping {
    #[serde(rename = "user_phrase")]
    pub phrase: String,

    #[serde(rename = "mapped_to")]
    pub mapped_field: String,

    pub similarity: f32,
}

/// Why the gate turned a prompt away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectionReason {
    /// The best mapping scored under the strict threshold
    BelowStrictThreshold { max_similarity: f32, strict: f32 },

    /// No mapping reached the relaxed threshold
    NoCandidateFields { relaxed: f32 },
}

/// A prompt that does not map to the catalog.
///
/// Carries the best mappings so the caller can rephrase.
#[derive(Error, Debug, Clone, Serialize)]
#[error("{message}")]
pub struct MappingRejection {
    #[serde(rename = "error")]
    pub message: String,

    pub detail: String,

    #[serde(rename = "top_suggestions")]
    pub suggestions: Vec<PhraseMapping>,

    #[serde(skip)]
    pub reason: RejectionReason,
}

/// Result of ranking catalog fields against a prompt's phrases.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    /// All recorded mappings, similarity descending
    pub mappings: Vec<PhraseMapping>,

    /// Best similarity seen, never below 0.0
    pub max_similarity: f32,

    /// Distinct field identifiers that cleared the relaxed threshold
    pub candidate_fields: Vec<String>,
}

impl FieldMapping {
    /// Rank fields for each phrase.
    ///
    /// `similarities` must have one row per phrase and one column per
    /// catalog field, in catalog order.
    pub fn from_similarities(
        phrases: &[String],
        similarities: &SimilarityMatrix,
        catalog: &FieldCatalog,
        thresholds: &MappingThresholds,
    ) -> Self {
        let mut mappings = Vec::new();
        let mut max_similarity = 0.0f32;

        for (row, phrase) in phrases.iter().enumerate().take(similarities.rows()) {
            let scores = similarities.row(row);
            for index in top_k_indices(scores, thresholds.fields_per_phrase) {
                let Some(field) = catalog.get(index) else {
                    continue;
                };
                let similarity = scores[index];
                max_similarity = max_similarity.max(similarity);
                mappings.push(PhraseMapping {
                    phrase: phrase.clone(),
                    mapped_field: field.value.clone(),
                    similarity,
                });
            }
        }

        // Candidates follow per-phrase ranking order, not global similarity order.
        let mut candidate_fields: Vec<String> = Vec::new();
        for mapping in &mappings {
            if mapping.similarity >= thresholds.relaxed
                && !candidate_fields.contains(&mapping.mapped_field)
            {
                candidate_fields.push(mapping.mapped_field.clone());
            }
        }

        mappings.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        tracing::debug!(
            phrases = phrases.len(),
            mappings = mappings.len(),
            max_similarity,
            candidates = candidate_fields.len(),
            "ranked catalog fields"
        );

        Self {
            mappings,
            max_similarity,
            candidate_fields,
        }
    }

    /// The best `n` mappings.
    pub fn top_suggestions(&self, n: usize) -> Vec<PhraseMapping> {
        self.mappings.iter().take(n).cloned().collect()
    }

    /// Decide whether the prompt maps cleanly enough to proceed.
    pub fn gate(&self, thresholds: &MappingThresholds) -> Result<(), MappingRejection> {
        let reason = if self.max_similarity < thresholds.strict {
            RejectionReason::BelowStrictThreshold {
                max_similarity: self.max_similarity,
                strict: thresholds.strict,
            }
        } else if self.candidate_fields.is_empty() {
            RejectionReason::NoCandidateFields {
                relaxed: thresholds.relaxed,
            }
        } else {
            return Ok(());
        };

        Err(MappingRejection {
            message: REJECTION_MESSAGE.to_string(),
            detail: REJECTION_DETAIL.to_string(),
            suggestions: self.top_suggestions(DEFAULT_FIELDS_PER_PHRASE),
            reason,
        })
    }

    /// Mean similarity of the top `window` mappings, clamped to `[0, 1]`.
    ///
    /// Zero when there are no mappings.
    pub fn confidence(&self, window: usize) -> f32 {
        let top: Vec<f32> = self
            .mappings
            .iter()
            .take(window)
            .map(|m| m.similarity)
            .collect();

        if top.is_empty() {
            return 0.0;
        }

        let mean = top.iter().sum::<f32>() / top.len() as f32;
        mean.clamp(0.0, 1.0)
    }
}
