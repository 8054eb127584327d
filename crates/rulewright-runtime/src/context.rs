//! Precomputed, shared pipeline state.
//!
//! Field and policy embeddings depend only on the catalog and the built-in
//! corpus, so they are computed once and reused by every request.

use rulewright_core::{Embedding, FieldCatalog, PolicyCorpus};
use thiserror::Error;

use crate::embedder::Embedder;
use crate::providers::ProviderError;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Failed to embed {what}: {source}")]
    Embedding {
        what: &'static str,
        source: ProviderError,
    },

    #[error("{what}: expected {expected} embeddings, got {actual}")]
    Misaligned {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what}: embedding {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{what}: embedding {index} has non-finite components")]
    NonFinite { what: &'static str, index: usize },
}

/// Catalog, policy corpus and their embeddings.
///
/// Immutable once built; share it behind an `Arc`. Every embedding in it
/// has the same dimension, and request-time vectors must match it.
#[derive(Debug, Clone)]
pub struct RuleContext {
    catalog: FieldCatalog,
    dimension: Option<usize>,
    field_embeddings: Vec<Embedding>,
    corpus: PolicyCorpus,
    policy_embeddings: Vec<Embedding>,
}

impl RuleContext {
    /// Embed the catalog and corpus.
    ///
    /// Both embedding calls run concurrently.
    pub async fn build(
        catalog: FieldCatalog,
        corpus: PolicyCorpus,
        embedder: &Embedder,
    ) -> Result<Self, ContextError> {
        let field_texts = catalog.embedding_texts();

        tracing::debug!(
            fields = catalog.len(),
            documents = corpus.len(),
            "embedding catalog and policy corpus"
        );

        let (field_embeddings, policy_embeddings) = tokio::try_join!(
            async {
                embedder
                    .embed(&field_texts)
                    .await
                    .map_err(|source| ContextError::Embedding {
                        what: "catalog fields",
                        source,
                    })
            },
            async {
                embedder
                    .embed(corpus.documents())
                    .await
                    .map_err(|source| ContextError::Embedding {
                        what: "policy corpus",
                        source,
                    })
            },
        )?;

        Self::from_parts(catalog, field_embeddings, corpus, policy_embeddings)
    }

    /// Assemble a context from precomputed embeddings.
    ///
    /// Embeddings must be index-aligned with `catalog.fields()` and
    /// `corpus.documents()` respectively.
    pub fn from_parts(
        catalog: FieldCatalog,
        field_embeddings: Vec<Embedding>,
        corpus: PolicyCorpus,
        policy_embeddings: Vec<Embedding>,
    ) -> Result<Self, ContextError> {
        if field_embeddings.len() != catalog.len() {
            return Err(ContextError::Misaligned {
                what: "catalog fields",
                expected: catalog.len(),
                actual: field_embeddings.len(),
            });
        }
        if policy_embeddings.len() != corpus.len() {
            return Err(ContextError::Misaligned {
                what: "policy corpus",
                expected: corpus.len(),
                actual: policy_embeddings.len(),
            });
        }

        let mut dimension = None;
        check_vectors("catalog fields", &field_embeddings, &mut dimension)?;
        check_vectors("policy corpus", &policy_embeddings, &mut dimension)?;

        Ok(Self {
            catalog,
            dimension,
            field_embeddings,
            corpus,
            policy_embeddings,
        })
    }

    /// Shared embedding dimension, `None` when the context holds no vectors.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Check request-time vectors against the context dimension.
    ///
    /// A mismatch is reported as a malformed provider response.
    pub fn check_request_vectors(
        &self,
        what: &str,
        vectors: &[Embedding],
    ) -> Result<(), ProviderError> {
        let Some(expected) = self.dimension else {
            return Ok(());
        };
        match vectors.iter().position(|v| v.len() != expected) {
            Some(i) => Err(ProviderError::MalformedResponse(format!(
                "{} embedding {} has dimension {}, context uses {}",
                what,
                i,
                vectors[i].len(),
                expected
            ))),
            None => Ok(()),
        }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn field_embeddings(&self) -> &[Embedding] {
        &self.field_embeddings
    }

    pub fn corpus(&self) -> &PolicyCorpus {
        &self.corpus
    }

    pub fn policy_embeddings(&self) -> &[Embedding] {
        &self.policy_embeddings
    }
}

/// All vectors share one dimension (seeded from `dimension` when already
/// known) and hold only finite components.
fn check_vectors(
    what: &'static str,
    vectors: &[Embedding],
    dimension: &mut Option<usize>,
) -> Result<(), ContextError> {
    for (index, v) in vectors.iter().enumerate() {
        let expected = *dimension.get_or_insert(v.len());
        if v.len() != expected {
            return Err(ContextError::DimensionMismatch {
                what,
                index,
                expected,
                actual: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(ContextError::NonFinite { what, index });
        }
    }
    Ok(())
}
