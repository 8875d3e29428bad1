//! Session-scoped speaker state: the in-memory map of speaker profiles per
//! session, its optional on-disk backing, and the per-session lock registry
//! that serializes resolver runs for one session without blocking unrelated
//! sessions.
//!
//! Grounded in `original_source/backend/diarization_service/speaker_tracker.py`'s
//! `SessionSpeakerStore` (session map, lazy load-from-disk on first touch,
//! `get_next_speaker_id`, `save_session`, `clear_session`).

mod snapshot;

use crate::speaker::{SpeakerProfile, SpeakerSummary};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Speaker profiles for one session, keyed by stable speaker id.
pub type SessionSpeakers = HashMap<String, SpeakerProfile>;

/// Holds every active session's speaker state and optionally mirrors it to
/// disk. Shared across requests behind an `Arc`.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionSpeakers>>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    persist_dir: Option<PathBuf>,
}

impl SessionStore {
    pub fn new(persist_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = &persist_dir {
            if let Err(e) = std::fs::create_dir_all(dir) {
                tracing::warn!(error = %e, dir = %dir.display(), "failed to create speaker persistence directory");
            } else {
                tracing::info!(dir = %dir.display(), "speaker profile persistence enabled");
            }
        }

        Self {
            sessions: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
            persist_dir,
        }
    }

    /// Returns the mutex guarding `session_id`, creating it if this is the
    /// first time the id has been seen. Callers hold this lock for the
    /// duration of one resolver run so concurrent chunks for the same
    /// session serialize while unrelated sessions proceed independently.
    pub fn lock_for(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Returns a clone of the session's current speaker profiles, loading
    /// them from disk on first access if persistence is enabled.
    pub fn snapshot(&self, session_id: &str) -> SessionSpeakers {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(existing) = sessions.get(session_id) {
            return existing.clone();
        }

        let loaded = self
            .persist_dir
            .as_deref()
            .map(|dir| snapshot::session_path(dir, session_id))
            .and_then(|path| match snapshot::read_session(&path) {
                Ok(profiles) => Some(profiles),
                Err(e) => {
                    tracing::error!(session_id, error = %e, "failed to load session snapshot");
                    None
                }
            })
            .unwrap_or_default();

        if !loaded.is_empty() {
            tracing::info!(session_id, speakers = loaded.len(), "loaded session from disk");
        } else {
            tracing::info!(session_id, "created new session");
        }

        sessions.insert(session_id.to_string(), loaded.clone());
        loaded
    }

    /// The next speaker id that would be allocated for a fresh speaker in
    /// this session, e.g. `SPEAKER_00`, `SPEAKER_01`, ...
    pub fn next_speaker_id(profiles: &SessionSpeakers) -> String {
        format!("SPEAKER_{:02}", profiles.len())
    }

    /// Replace the in-memory state for `session_id` and, if persistence is
    /// configured, write it through to disk.
    pub fn replace(&self, session_id: &str, profiles: SessionSpeakers) {
        if let Some(dir) = &self.persist_dir {
            if !profiles.is_empty() {
                let path = snapshot::session_path(dir, session_id);
                if let Err(e) = snapshot::write_session(&path, &profiles) {
                    tracing::error!(session_id, error = %e, "failed to persist session");
                } else {
                    tracing::info!(session_id, speakers = profiles.len(), "saved session");
                }
            }
        }

        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), profiles);
    }

    /// Summary of every speaker currently tracked for a session.
    pub fn speakers_summary(&self, session_id: &str) -> Vec<SpeakerSummary> {
        self.snapshot(session_id)
            .into_iter()
            .map(|(speaker_id, profile)| SpeakerSummary {
                speaker_id,
                total_duration: profile.total_duration(),
                chunk_count: profile.chunk_count(),
            })
            .collect()
    }

    /// Drop a session from memory and, if persisted, delete its snapshot
    /// file. Returns whether a session existed to clear.
    pub fn clear(&self, session_id: &str) -> bool {
        let existed = self.sessions.lock().unwrap().remove(session_id).is_some();

        if let Some(dir) = &self.persist_dir {
            let path = snapshot::session_path(dir, session_id);
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(session_id, error = %e, "failed to remove session snapshot");
                }
            }
        }

        self.locks.lock().unwrap().remove(session_id);
        tracing::info!(session_id, "cleared session");
        existed
    }
}
