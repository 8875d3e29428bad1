//! HTTP client for the Embedder collaborator.
//!
//! The original pyannote-based embedding model
//! (`speaker_tracker.py::SpeakerTracker.extract_embedding`) ran in-process;
//! here it is an out-of-process HTTP collaborator, following the same
//! multipart-upload shape as `HttpTranscriber` but against an
//! embedding-specific endpoint that also takes the segment's start/end
//! offsets as form fields.

use super::Embedder;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const COLLABORATOR: &str = "embedder";
const EMBED_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedder backed by a remote voice-embedding HTTP server.
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/embed", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    /// Extracts a voice embedding for `[start, end]` of `audio_path`.
    /// Any failure — network, non-2xx, malformed body — collapses to
    /// `None`: embedding extraction is an enhancement the resolver can
    /// fall back around, never a reason to fail the request.
    async fn embed(&self, audio_path: &Path, start: f64, end: f64) -> Option<Vec<f32>> {
        let bytes = tokio::fs::read(audio_path).await.ok()?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("segment.wav")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .ok()?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("start", start.to_string())
            .text("end", end.to_string());

        let mut request = self
            .client
            .post(self.endpoint())
            .timeout(EMBED_TIMEOUT)
            .multipart(form);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.ok()?;
        if !response.status().is_success() {
            tracing::debug!(
                collaborator = COLLABORATOR,
                status = %response.status(),
                "embedder returned non-success status"
            );
            return None;
        }

        let parsed: EmbedResponse = response.json().await.ok()?;
        Some(parsed.embedding)
    }

    async fn health(&self) -> bool {
        self.client
            .get(&self.base_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
