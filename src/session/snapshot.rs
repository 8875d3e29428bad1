//! JSON-encoded on-disk representation of a session's speaker profiles.
//!
//! `original_source/backend/diarization_service/speaker_tracker.py`'s
//! `SessionSpeakerStore` persists one `.npz` per session keyed
//! `<speaker_id>_centroid` / `_duration` / `_count`. A `.npz` is just a zip of
//! named numpy arrays — any self-describing container holding the same three
//! fields per speaker is equivalent, so this keeps the one-file-per-session
//! layout but switches the encoding to JSON, already pervasive in this
//! crate's stack via `serde_json`, rather than pulling in a new binary
//! array format.

use crate::speaker::{Embedding, SpeakerProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSpeaker {
    centroid: Embedding,
    total_duration: f64,
    chunk_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    speakers: HashMap<String, PersistedSpeaker>,
}

/// Path a session's snapshot would live at under `persist_dir`.
pub fn session_path(persist_dir: &Path, session_id: &str) -> PathBuf {
    persist_dir.join(format!("{session_id}.json"))
}

/// Serialize `profiles` to `path`. Speakers with no centroid yet (no
/// embeddings observed) are omitted, mirroring the original's `if
/// profile.centroid is not None` guard.
pub fn write_session(
    path: &Path,
    profiles: &HashMap<String, SpeakerProfile>,
) -> std::io::Result<()> {
    let speakers = profiles
        .iter()
        .filter_map(|(id, profile)| {
            let centroid = profile.centroid()?;
            Some((
                id.clone(),
                PersistedSpeaker {
                    centroid,
                    total_duration: profile.total_duration(),
                    chunk_count: profile.chunk_count(),
                },
            ))
        })
        .collect();

    let body = serde_json::to_vec_pretty(&PersistedSession { speakers })
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, body)
}

/// Load a session snapshot from `path`. Returns an empty map if the file is
/// absent; any other failure propagates.
pub fn read_session(path: &Path) -> std::io::Result<HashMap<String, SpeakerProfile>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let body = std::fs::read(path)?;
    let persisted: PersistedSession = serde_json::from_slice(&body)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(persisted
        .speakers
        .into_iter()
        .map(|(id, speaker)| {
            let profile = SpeakerProfile::from_snapshot(
                id.clone(),
                speaker.centroid,
                speaker.total_duration,
                speaker.chunk_count,
            );
            (id, profile)
        })
        .collect())
}
