//! # rulewright-core
//!
//! Deterministic half of the rule-generation pipeline.
//!
//! Everything here works on text and precomputed embeddings: no network
//! calls, no model invocations. Given the same inputs every function
//! returns the same output.
//!
//! - [`extract_phrases`] splits a policy statement into semantic chunks
//! - [`similarity_matrix`] compares embeddings
//! - [`FieldMapping`] ranks catalog fields per phrase and owns the gate
//! - [`select_snippets`] picks the most relevant policy documents
//! - [`unrecognized_fields`] audits a generated rule against the catalog
//!
//! ## Example
//!
//! ```rust,ignore
//! use rulewright_core::{rank_fields, extract_phrases, FieldCatalog, MappingThresholds};
//!
//! let catalog = FieldCatalog::builtin()?;
//! let phrases = extract_phrases("bureau score below 600 and overdue amount above 50000");
//! let mapping = rank_fields(&phrases, &phrase_vectors, &catalog, &field_vectors,
//!     &MappingThresholds::default());
//!
//! match mapping.gate(&MappingThresholds::default()) {
//!     Ok(()) => println!("candidates: {:?}", mapping.candidate_fields),
//!     Err(rejection) => println!("{}", rejection),
//! }
//! ```

pub mod catalog;
pub mod logic;
pub mod mapping;
pub mod phrases;
pub mod policy;
pub mod retrieval;
pub mod similarity;
pub mod types;

pub use catalog::{CatalogError, FieldCatalog, FieldDescriptor};
pub use logic::{referenced_fields, unrecognized_fields};
pub use mapping::{
    FieldMapping, MappingRejection, MappingThresholds, PhraseMapping, RejectionReason,
};
pub use phrases::extract_phrases;
pub use policy::{PolicyCorpus, PolicyError};
pub use retrieval::{rank_documents, select_snippets, DEFAULT_RETRIEVAL_TOP_K};
pub use similarity::{cosine_similarity, similarity_matrix, top_k_indices, Embedding};
pub use types::{GeneratedRule, RuleRequest, RuleResponse};

/// Rank catalog fields against embedded phrases.
///
/// `phrase_embeddings` is index-aligned with `phrases`, `field_embeddings`
/// with `catalog.fields()`.
pub fn rank_fields(
    phrases: &[String],
    phrase_embeddings: &[Embedding],
    catalog: &FieldCatalog,
    field_embeddings: &[Embedding],
    thresholds: &MappingThresholds,
) -> FieldMapping {
    let matrix = similarity_matrix(phrase_embeddings, field_embeddings);
    FieldMapping::from_similarities(phrases, &matrix, catalog, thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(index: usize, dims: usize) -> Embedding {
        let mut v = vec![0.0; dims];
        v[index] = 1.0;
        v
    }

    #[test]
    fn test_rank_fields_end_to_end() {
        let catalog = FieldCatalog::builtin().unwrap();
        let dims = catalog.len();
        let field_embeddings: Vec<Embedding> = (0..dims).map(|i| one_hot(i, dims)).collect();

        let bureau = catalog.values().position(|v| v == "bureau_score").unwrap();
        let overdue = catalog.values().position(|v| v == "overdue_amount").unwrap();

        let phrases = extract_phrases("bureau score below 600 and overdue amount above 50000");
        let phrase_embeddings = vec![one_hot(bureau, dims), one_hot(overdue, dims)];

        let thresholds = MappingThresholds::default();
        let mapping = rank_fields(
            &phrases,
            &phrase_embeddings,
            &catalog,
            &field_embeddings,
            &thresholds,
        );

        assert!(mapping.gate(&thresholds).is_ok());
        assert_eq!(mapping.candidate_fields, vec!["bureau_score", "overdue_amount"]);
        assert!(mapping.confidence(3) > 0.0);
    }

    #[test]
    fn test_rank_fields_rejects_unrelated_prompt() {
        let catalog = FieldCatalog::builtin().unwrap();
        let dims = catalog.len() + 1;
        let field_embeddings: Vec<Embedding> =
            (0..catalog.len()).map(|i| one_hot(i, dims)).collect();

        let phrases = extract_phrases("purple elephants dance");
        let phrase_embeddings = vec![one_hot(catalog.len(), dims)];

        let thresholds = MappingThresholds::default();
        let mapping = rank_fields(
            &phrases,
            &phrase_embeddings,
            &catalog,
            &field_embeddings,
            &thresholds,
        );

        assert!(mapping.gate(&thresholds).is_err());
        assert_eq!(mapping.max_similarity, 0.0);
    }
}
