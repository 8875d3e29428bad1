//! Per-request pipeline: transcribe, optionally diarize and resolve speaker
//! identity, then merge into annotated segments.
//!
//! Generalizes `original_source/backend/diarization_service/processor.py`'s
//! `AudioProcessor.process_audio`. Collaborator failures degrade gracefully
//! rather than failing the whole request: a transcoder or diarizer that
//! errors just means the response carries `UNKNOWN` speakers, the same
//! outcome as `diarize=false`.

use crate::collaborators::{AnnotatedSegment, DiarizationTurn, Diarizer, Embedder, Transcoder, Transcriber};
use crate::error::ServiceError;
use crate::merger;
use crate::resolver;
use crate::session::SessionStore;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// One chunk's worth of work: the uploaded audio plus the request's
/// diarization options.
pub struct ProcessRequest {
    pub audio_bytes: Vec<u8>,
    pub enable_diarization: bool,
    pub session_id: Option<String>,
    pub num_speakers_hint: Option<u32>,
    pub temperature: Option<f32>,
}

/// Coordinates the Transcriber, Transcoder, Diarizer and Embedder
/// collaborators for each request.
pub struct Orchestrator {
    transcriber: Arc<dyn Transcriber>,
    diarizer: Arc<dyn Diarizer>,
    transcoder: Arc<dyn Transcoder>,
    embedder: Option<Arc<dyn Embedder>>,
    sessions: Arc<SessionStore>,
}

impl Orchestrator {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        diarizer: Arc<dyn Diarizer>,
        transcoder: Arc<dyn Transcoder>,
        embedder: Option<Arc<dyn Embedder>>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            transcriber,
            diarizer,
            transcoder,
            embedder,
            sessions,
        }
    }

    pub async fn process(&self, request: ProcessRequest) -> Result<Vec<AnnotatedSegment>, ServiceError> {
        let input_file = write_temp_audio(&request.audio_bytes)?;

        tracing::info!("transcribing audio");
        let transcript = self
            .transcriber
            .transcribe(input_file.path(), request.temperature)
            .await?;

        if transcript.is_empty() {
            tracing::warn!("transcriber returned no segments");
            return Ok(Vec::new());
        }
        tracing::info!(segments = transcript.len(), "transcription complete");

        let mut turns: Vec<DiarizationTurn> = Vec::new();

        if request.enable_diarization {
            turns = self
                .diarize(input_file.path(), request.num_speakers_hint)
                .await;

            if !turns.is_empty() {
                if let (Some(session_id), Some(embedder)) = (&request.session_id, &self.embedder) {
                    let lock = self.sessions.lock_for(session_id);
                    let _guard = lock.lock().await;
                    turns = resolver::resolve(
                        &self.sessions,
                        session_id,
                        input_file.path(),
                        embedder.as_ref(),
                        turns,
                        request.num_speakers_hint,
                    )
                    .await;
                }
            }
        } else {
            tracing::info!("diarization disabled by request");
        }

        Ok(merger::merge(transcript, &turns))
    }

    async fn diarize(&self, audio_path: &std::path::Path, num_speakers_hint: Option<u32>) -> Vec<DiarizationTurn> {
        let diarization_input = match NamedTempFile::new() {
            Ok(f) => f,
            Err(e) => {
                tracing::error!(error = %e, "failed to allocate diarization temp file");
                return Vec::new();
            }
        };

        if let Err(e) = self
            .transcoder
            .transcode(audio_path, diarization_input.path())
            .await
        {
            tracing::warn!(error = %e, "audio conversion failed, skipping diarization");
            return Vec::new();
        }

        match self
            .diarizer
            .diarize(diarization_input.path(), num_speakers_hint)
            .await
        {
            Ok(turns) => {
                tracing::info!(turns = turns.len(), "diarization complete");
                turns
            }
            Err(e) => {
                tracing::warn!(error = %e, "diarization failed, returning unattributed segments");
                Vec::new()
            }
        }
    }
}

fn write_temp_audio(bytes: &[u8]) -> Result<NamedTempFile, ServiceError> {
    use std::io::Write;
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}
