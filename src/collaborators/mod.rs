//! Narrow trait interfaces to the external collaborators this service
//! wraps: Transcriber, Diarizer, Embedder, Transcoder. Each is an opaque
//! service reached over a process boundary (HTTP or subprocess); the core
//! never reasons about their internals.
//!
//! Each is a `Send + Sync` `async_trait`, one or more concrete
//! implementations, held behind `Arc<dyn Trait>` in shared state.

pub mod diarizer;
pub mod embedder;
pub mod transcoder;
pub mod transcriber;

use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use diarizer::SubprocessDiarizer;
pub use embedder::HttpEmbedder;
pub use transcoder::FfmpegTranscoder;
pub use transcriber::HttpTranscriber;

/// A transcribed span of speech, as returned by the Transcriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// A speaker turn from the Diarizer. `local_label` is unique only within
/// one diarizer invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiarizationTurn {
    pub local_label: String,
    pub start: f64,
    pub end: f64,
}

impl DiarizationTurn {
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// One output segment: transcription text, its timing, and the speaker that
/// produced it — either a stable session identifier or the sentinel
/// `UNKNOWN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub speaker: String,
}

/// Sentinel speaker label used when no turn overlaps a segment, or when
/// diarization did not run at all.
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// Given an audio file path, returns an ordered sequence of transcribed
/// segments.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio_path: &Path,
        temperature: Option<f32>,
    ) -> Result<Vec<TranscriptionSegment>, CollaboratorError>;

    /// Cheap liveness probe, surfaced via `/health`.
    async fn health(&self) -> bool;
}

/// Given an audio file path and an optional speaker-count hint, returns an
/// ordered sequence of speaker turns.
#[async_trait]
pub trait Diarizer: Send + Sync {
    async fn diarize(
        &self,
        audio_path: &Path,
        num_speakers_hint: Option<u32>,
    ) -> Result<Vec<DiarizationTurn>, CollaboratorError>;

    async fn health(&self) -> bool;
}

/// Given an audio file path and a time interval, returns a fixed-dimensional
/// embedding characterizing the dominant voice in that interval, or `None`
/// on any failure — extraction failure is never an error the orchestrator
/// needs to propagate, only a signal to pass the local label through.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, audio_path: &Path, start: f64, end: f64) -> Option<Vec<f32>>;

    async fn health(&self) -> bool;
}

/// Given an input audio file, produces a normalized PCM file (mono, 16kHz)
/// at `output_path`.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input_path: &Path, output_path: &Path) -> Result<(), CollaboratorError>;
}
