//! Cosine scoring and top-k selection over chunk vectors.

use ordered_float::OrderedFloat;

use crate::error::{EmbeddingError, Result};

/// Added to the norm product so zero vectors score 0 instead of NaN.
pub const SIMILARITY_EPSILON: f32 = 1e-8;

/// Compute the cosine similarity between two embeddings.
///
/// `dot(a, b) / (|a| * |b| + ε)`. Returns a value between -1.0 and 1.0,
/// where 1.0 means identical direction; a zero vector scores 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();

    Ok(dot / (norm(a) * norm(b) + SIMILARITY_EPSILON))
}

/// Rank `candidates` against `query` and keep the best `k`, as `(position, score)`.
///
/// Equal scores keep candidate order.
pub fn rank_top_k<'a, I>(query: &[f32], candidates: I, k: usize) -> Result<Vec<(usize, f32)>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scores: Vec<(usize, OrderedFloat<f32>)> = Vec::new();
    for (position, candidate) in candidates.into_iter().enumerate() {
        let score = cosine_similarity(candidate, query)?;
        scores.push((position, OrderedFloat(score)));
    }

    // Stable, so ties stay in candidate order.
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(scores
        .into_iter()
        .take(k)
        .map(|(position, score)| (position, score.0))
        .collect())
}
