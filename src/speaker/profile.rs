//! Per-speaker profile: bounded embedding history plus derived centroid.

use super::{centroid_of, Embedding};

/// Maximum number of embeddings retained per speaker. Oldest-first eviction
/// is a deliberate recency bias: the centroid should track the current
/// acoustic environment (fatigue, distance from microphone), not the
/// session's first minute.
pub const MAX_EMBEDDINGS: usize = 50;

/// Aggregate state for one stable speaker within a session.
#[derive(Debug, Clone)]
pub struct SpeakerProfile {
    speaker_id: String,
    embeddings: Vec<Embedding>,
    total_duration: f64,
    chunk_count: u64,
}

impl SpeakerProfile {
    /// Create a new, empty profile for `speaker_id`.
    pub fn new(speaker_id: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            embeddings: Vec::new(),
            total_duration: 0.0,
            chunk_count: 0,
        }
    }

    /// Reconstruct a profile from a persisted snapshot. Only the centroid is
    /// stored on disk, so the embedding history collapses to the singleton
    /// `[centroid]`; individual past embeddings are not recoverable.
    pub fn from_snapshot(speaker_id: impl Into<String>, centroid: Embedding, total_duration: f64, chunk_count: u64) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            embeddings: vec![centroid],
            total_duration,
            chunk_count,
        }
    }

    pub fn speaker_id(&self) -> &str {
        &self.speaker_id
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    /// Append a new observation: add `embedding`, accumulate `duration`
    /// seconds, and bump the chunk count. If the embedding history exceeds
    /// [`MAX_EMBEDDINGS`], the oldest entries are dropped.
    pub fn add_embedding(&mut self, embedding: Embedding, duration: f64) {
        self.embeddings.push(embedding);
        if self.embeddings.len() > MAX_EMBEDDINGS {
            let overflow = self.embeddings.len() - MAX_EMBEDDINGS;
            self.embeddings.drain(0..overflow);
        }
        self.total_duration += duration;
        self.chunk_count += 1;
    }

    /// Mean of the stored embeddings, or `None` if none have been observed.
    pub fn centroid(&self) -> Option<Embedding> {
        centroid_of(&self.embeddings)
    }
}
