//! Cosine similarity over embedding vectors.

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

/// Added to every norm so all-zero vectors compare as 0.0 instead of NaN.
pub const NORM_EPSILON: f32 = 1e-8;

/// Row-major `rows × cols` matrix of cosine similarities.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            Some(self.values[row * self.cols + col])
        } else {
            None
        }
    }

    /// Similarities of one left-hand vector against every right-hand vector.
    pub fn row(&self, row: usize) -> &[f32] {
        let start = (row * self.cols).min(self.values.len());
        let end = (start + self.cols).min(self.values.len());
        &self.values[start..end]
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn normalized(v: &[f32]) -> Embedding {
    let scale = norm(v) + NORM_EPSILON;
    v.iter().map(|x| x / scale).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity of two vectors.
///
/// Vectors of different lengths are compared over their common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    dot(a, b) / ((norm(a) + NORM_EPSILON) * (norm(b) + NORM_EPSILON))
}

/// Pairwise cosine similarities, `a.len()` rows by `b.len()` columns.
///
/// Either side may be empty; the result then has a zero dimension.
pub fn similarity_matrix(a: &[Embedding], b: &[Embedding]) -> SimilarityMatrix {
    let b_norm: Vec<Embedding> = b.iter().map(|v| normalized(v)).collect();

    let mut values = Vec::with_capacity(a.len() * b.len());
    for left in a {
        let left = normalized(left);
        values.extend(b_norm.iter().map(|right| dot(&left, right)));
    }

    SimilarityMatrix {
        rows: a.len(),
        cols: b.len(),
        values,
    }
}

/// Indices of the `k` highest scores, best first.
///
/// Equal scores keep ascending index order. Ordering is `f32::total_cmp`.
pub fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&i, &j| scores[j].total_cmp(&scores[i]));
    indices.truncate(k);
    indices
}
