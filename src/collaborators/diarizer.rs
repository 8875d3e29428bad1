//! Subprocess-based Diarizer collaborator.
//!
//! Spawns a one-shot diarization worker process per chunk and reads its
//! JSON turn list from stdout, giving the same memory/GPU isolation benefit
//! as spawning a fresh process per transcription invocation — here there is
//! no eager pre-warming step (diarization is only invoked once per chunk,
//! and only when a chunk actually needs it), so a simple spawn-wait-parse
//! shape is used instead of a stdin/stdout READY handshake.

use super::{Diarizer, DiarizationTurn};
use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

const COLLABORATOR: &str = "diarizer";

#[derive(Debug, Deserialize)]
struct WorkerTurn {
    speaker: String,
    start: f64,
    end: f64,
}

/// Diarizer that shells out to an external worker binary for each call.
pub struct SubprocessDiarizer {
    command: String,
    model: String,
}

impl SubprocessDiarizer {
    pub fn new(command: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Diarizer for SubprocessDiarizer {
    async fn diarize(
        &self,
        audio_path: &Path,
        num_speakers_hint: Option<u32>,
    ) -> Result<Vec<DiarizationTurn>, CollaboratorError> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--model")
            .arg(&self.model)
            .arg(audio_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(hint) = num_speakers_hint {
            cmd.arg("--num-speakers").arg(hint.to_string());
        }

        let output = cmd.output().await.map_err(|e| CollaboratorError::Unavailable {
            collaborator: COLLABORATOR,
            message: format!("failed to spawn {}: {e}", self.command),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::Unavailable {
                collaborator: COLLABORATOR,
                message: format!("worker exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let turns: Vec<WorkerTurn> = serde_json::from_slice(&output.stdout).map_err(|e| {
            CollaboratorError::Malformed {
                collaborator: COLLABORATOR,
                message: e.to_string(),
            }
        })?;

        Ok(turns
            .into_iter()
            .map(|t| DiarizationTurn {
                local_label: t.speaker,
                start: t.start,
                end: t.end,
            })
            .collect())
    }

    async fn health(&self) -> bool {
        which_exists(&self.command)
    }
}

fn which_exists(command: &str) -> bool {
    if command.contains('/') {
        return Path::new(command).exists();
    }
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| dir.join(command).is_file())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn which_exists_finds_known_binary() {
        // `sh` is present on every platform this service targets.
        assert!(which_exists("sh"));
    }

    #[test]
    fn which_exists_rejects_unknown_binary() {
        assert!(!which_exists("definitely-not-a-real-binary-xyz"));
    }
}
