//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors (or either vector is all zeros)
/// - -1.0 means opposite vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}

/// Highest cosine similarity between `query` and any of `candidates`.
///
/// Returns `None` when there are no candidates.
pub fn max_similarity<'a, I>(query: &[f32], candidates: I) -> Result<Option<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut best: Option<f32> = None;
    for candidate in candidates {
        let score = cosine_similarity(query, candidate)?;
        best = Some(best.map_or(score, |b| b.max(score)));
    }
    Ok(best)
}

/// A similarity search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// ID of the matched item.
    pub id: String,

    /// Similarity score.
    pub score: f32,
}

impl SimilarityResult {
    /// Create a new similarity result.
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// Find the top-k most similar embeddings.
///
/// Candidates with equal scores keep their input order.
pub fn find_top_k<'a, I>(
    query: &[f32],
    candidates: I,
    k: usize,
    min_score: f32,
) -> Result<Vec<SimilarityResult>>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let mut scores: Vec<(OrderedFloat<f32>, &str)> = Vec::new();

    for (id, embedding) in candidates {
        let score = cosine_similarity(query, embedding)?;
        if score >= min_score {
            scores.push((OrderedFloat(score), id));
        }
    }

    // Stable sort, descending by score
    scores.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(scores
        .into_iter()
        .take(k)
        .map(|(score, id)| SimilarityResult::new(id, score.0))
        .collect())
}

/// Normalize an embedding to unit length.
pub fn normalize(embedding: &mut [f32]) {
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).is_err());
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_max_similarity() {
        let query = vec![1.0, 0.0];
        let a = vec![0.0, 1.0];
        let b = vec![1.0, 1.0];
        let best = max_similarity(&query, [a.as_slice(), b.as_slice()]).unwrap();
        assert!((best.unwrap() - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);

        let none = max_similarity(&query, std::iter::empty()).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_find_top_k() {
        let query = vec![1.0, 0.0, 0.0];
        let a = vec![1.0, 0.0, 0.0]; // similarity 1.0
        let b = vec![0.0, 1.0, 0.0]; // similarity 0.0
        let c = vec![0.7, 0.7, 0.0]; // similarity ~0.7
        let candidates = [("a", a.as_slice()), ("b", b.as_slice()), ("c", c.as_slice())];

        let results = find_top_k(&query, candidates, 2, 0.0).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "c");
    }

    #[test]
    fn test_find_top_k_ties_keep_input_order() {
        let query = vec![1.0, 0.0];
        let same = vec![1.0, 0.0];
        let candidates = [
            ("first", same.as_slice()),
            ("second", same.as_slice()),
            ("third", same.as_slice()),
        ];

        let ids: Vec<String> = find_top_k(&query, candidates, 3, 0.0)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }
}
