//! Policy snippet retrieval.
//!
//! Per-request extra documents are embedded on the fly and ranked together
//! with the precomputed built-in corpus.

use rulewright_core::select_snippets;

use crate::context::RuleContext;
use crate::embedder::Embedder;
use crate::providers::ProviderError;

/// The `top_k` policy documents most similar to `prompt`.
///
/// Candidates are the context's corpus followed by `extra_docs`; ties keep
/// that order. Returns `min(top_k, total)` documents.
pub async fn retrieve_snippets(
    prompt: &str,
    extra_docs: &[String],
    context: &RuleContext,
    embedder: &Embedder,
    top_k: usize,
) -> Result<Vec<String>, ProviderError> {
    let query = [prompt.to_string()];
    let (extra_embeddings, query_embeddings) =
        tokio::try_join!(embedder.embed(extra_docs), embedder.embed(&query))?;
    context.check_request_vectors("context document", &extra_embeddings)?;
    context.check_request_vectors("prompt", &query_embeddings)?;

    let documents = context.corpus().with_extra(extra_docs);

    let mut embeddings = context.policy_embeddings().to_vec();
    embeddings.extend(extra_embeddings);

    let Some(query) = query_embeddings.into_iter().next() else {
        return Err(ProviderError::MalformedResponse(
            "no embedding returned for prompt".to_string(),
        ));
    };

    let snippets = select_snippets(&query, documents.documents(), &embeddings, top_k);

    tracing::debug!(
        candidates = documents.len(),
        extra = extra_docs.len(),
        selected = snippets.len(),
        "retrieved policy snippets"
    );

    Ok(snippets)
}
