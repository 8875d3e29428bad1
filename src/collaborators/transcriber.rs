//! HTTP client for the Transcriber collaborator.
//!
//! Posts audio to a whisper.cpp-compatible `/inference` endpoint and parses
//! its `segments` array, building the multipart request the same way a
//! remote transcription client typically does, but adding the per-segment
//! timing extraction that `whisper_client.py::_parse_whisper_response`
//! performs on the identical wire shape.

use super::{Transcriber, TranscriptionSegment};
use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const COLLABORATOR: &str = "transcriber";

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    text: String,
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
}

/// Transcriber backed by a remote whisper.cpp-compatible HTTP server.
pub struct HttpTranscriber {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTranscriber {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/inference", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
        temperature: Option<f32>,
    ) -> Result<Vec<TranscriptionSegment>, CollaboratorError> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .map_err(|e| CollaboratorError::Unavailable {
                collaborator: COLLABORATOR,
                message: format!("failed to read audio file: {e}"),
            })?;

        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| CollaboratorError::Unavailable {
                collaborator: COLLABORATOR,
                message: e.to_string(),
            })?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("response_format", "json")
            .text("temperature", temperature.unwrap_or(0.0).to_string());

        let response = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout {
                        collaborator: COLLABORATOR,
                    }
                } else {
                    CollaboratorError::Unavailable {
                        collaborator: COLLABORATOR,
                        message: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Unavailable {
                collaborator: COLLABORATOR,
                message: format!("server returned {}", response.status()),
            });
        }

        let parsed: WhisperResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed {
                collaborator: COLLABORATOR,
                message: e.to_string(),
            })?;

        let segments = if !parsed.segments.is_empty() {
            parsed
                .segments
                .into_iter()
                .map(|s| TranscriptionSegment {
                    text: s.text.trim().to_string(),
                    start: s.start,
                    end: s.end,
                })
                .collect()
        } else if let Some(text) = parsed.text {
            vec![TranscriptionSegment {
                text: text.trim().to_string(),
                start: 0.0,
                end: 0.0,
            }]
        } else {
            Vec::new()
        };

        Ok(segments)
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
