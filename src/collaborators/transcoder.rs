//! Ffmpeg-based Transcoder collaborator.
//!
//! Mirrors `original_source/backend/diarization_service/audio_utils.py`'s
//! `AudioConverter.convert_to_wav`: shell out to `ffmpeg -i <in> -ar 16000
//! -ac 1 -y <out>`, translated from a blocking `subprocess.run` to
//! `tokio::process::Command`.

use super::Transcoder;
use crate::error::CollaboratorError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

const COLLABORATOR: &str = "transcoder";

/// Target sample rate pyannote and whisper.cpp both expect.
const TARGET_SAMPLE_RATE: u32 = 16_000;
const TARGET_CHANNELS: u32 = 1;

/// Transcoder backed by an `ffmpeg` binary on `PATH`.
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }

    #[cfg(test)]
    fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input_path: &Path, output_path: &Path) -> Result<(), CollaboratorError> {
        let output = Command::new(&self.binary)
            .arg("-i")
            .arg(input_path)
            .arg("-ar")
            .arg(TARGET_SAMPLE_RATE.to_string())
            .arg("-ac")
            .arg(TARGET_CHANNELS.to_string())
            .arg("-y")
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CollaboratorError::Unavailable {
                collaborator: COLLABORATOR,
                message: format!("failed to spawn {}: {e}", self.binary),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::Unavailable {
                collaborator: COLLABORATOR,
                message: format!("ffmpeg exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(())
    }
}
