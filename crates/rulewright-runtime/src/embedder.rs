//! Embedding client.
//!
//! Wraps an [`EmbeddingProvider`] and checks that what comes back is
//! usable: one vector per input, all of the same non-zero dimension, with
//! finite components only.

use rulewright_core::Embedding;
use std::sync::Arc;

use crate::providers::{EmbeddingConfig, EmbeddingProvider, ProviderError};

#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingConfig,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Embed `texts`, one vector per input in the same order.
    ///
    /// An empty input returns immediately without calling the provider.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            provider = self.provider.name(),
            model = %self.config.model,
            inputs = texts.len(),
            "requesting embeddings"
        );

        let vectors = self.provider.embed(texts, &self.config).await?;
        check_vectors(texts.len(), &vectors)?;
        Ok(vectors)
    }
}

fn check_vectors(expected: usize, vectors: &[Embedding]) -> Result<(), ProviderError> {
    if vectors.len() != expected {
        return Err(ProviderError::MalformedResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }

    let dims = vectors.first().map(Vec::len).unwrap_or_default();
    if dims == 0 {
        return Err(ProviderError::MalformedResponse(
            "embedding vectors are empty".to_string(),
        ));
    }

    if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dims) {
        return Err(ProviderError::MalformedResponse(format!(
            "embedding {} has dimension {}, expected {}",
            i,
            v.len(),
            dims
        )));
    }

    if let Some(i) = vectors
        .iter()
        .position(|v| v.iter().any(|x| !x.is_finite()))
    {
        return Err(ProviderError::MalformedResponse(format!(
            "embedding {} has non-finite components",
            i
        )));
    }

    Ok(())
}
