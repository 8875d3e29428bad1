//! Speaker embeddings and per-speaker profile aggregation.
//!
//! Grounded in `original_source/backend/diarization_service/speaker_tracker.py`'s
//! `SpeakerProfile`/cosine-similarity logic, with the zero-norm guard on the
//! similarity formula written the way Rust embedding-comparison code usually
//! is.

mod profile;

pub use profile::SpeakerProfile;

use serde::{Deserialize, Serialize};

/// A fixed-length voice embedding. The dimension is whatever the Embedder
/// collaborator returns at runtime; this type places no constraint on it
/// beyond requiring equal length for similarity comparisons.
pub type Embedding = Vec<f32>;

/// Public summary of one speaker's tracked state, as returned by
/// `GET /session/{id}/speakers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSummary {
    pub speaker_id: String,
    pub total_duration: f64,
    pub chunk_count: u64,
}

/// Cosine similarity between two embeddings.
///
/// Returns `0.0` if either vector has zero norm (or the vectors differ in
/// length), otherwise `dot(a, b) / (norm(a) * norm(b))`, clamped to
/// `[-1.0, 1.0]` to absorb floating-point rounding.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Arithmetic mean of a non-empty slice of equal-length embeddings.
pub fn centroid_of(embeddings: &[Embedding]) -> Option<Embedding> {
    let first = embeddings.first()?;
    let dim = first.len();
    let mut sum = vec![0.0f32; dim];

    for embedding in embeddings {
        for (acc, value) in sum.iter_mut().zip(embedding.iter()) {
            *acc += value;
        }
    }

    let n = embeddings.len() as f32;
    for value in sum.iter_mut() {
        *value /= n;
    }

    Some(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_maximally_similar() {
        let a = vec![0.3, 0.1, -0.4];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_are_zero_similarity() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_are_minus_one() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_norm_is_defined_as_zero() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn mismatched_length_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = vec![0.2, 0.7, -0.1];
        let b = vec![-0.3, 0.4, 0.9];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn centroid_is_elementwise_mean() {
        let embeddings = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(centroid_of(&embeddings), Some(vec![2.0, 3.0]));
    }

    #[test]
    fn centroid_of_empty_is_none() {
        let embeddings: Vec<Embedding> = Vec::new();
        assert_eq!(centroid_of(&embeddings), None);
    }
}
