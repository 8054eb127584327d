//! Policy snippet ranking.

use crate::similarity::{similarity_matrix, top_k_indices, Embedding};

/// Snippets returned per request unless configured otherwise.
pub const DEFAULT_RETRIEVAL_TOP_K: usize = 3;

/// Rank documents against a query embedding.
///
/// Returns document indices, most similar first, at most `top_k` of them.
/// Ties keep document order.
pub fn rank_documents(query: &Embedding, documents: &[Embedding], top_k: usize) -> Vec<usize> {
    let matrix = similarity_matrix(std::slice::from_ref(query), documents);
    if matrix.rows() == 0 {
        return Vec::new();
    }
    top_k_indices(matrix.row(0), top_k)
}

/// Pick the `top_k` documents most similar to `query`.
///
/// `documents` and `embeddings` must be index-aligned; surplus entries on
/// either side are ignored.
pub fn select_snippets(
    query: &Embedding,
    documents: &[String],
    embeddings: &[Embedding],
    top_k: usize,
) -> Vec<String> {
    let usable = documents.len().min(embeddings.len());
    rank_documents(query, &embeddings[..usable], top_k)
        .into_iter()
        .map(|i| documents[i].clone())
        .collect()
}
