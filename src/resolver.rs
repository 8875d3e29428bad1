//! Cross-chunk speaker identity resolution.
//!
//! Generalizes `original_source/backend/diarization_service/speaker_tracker.py`'s
//! `SpeakerTracker.assign_speakers`: group a chunk's diarization turns by
//! their local (chunk-scoped) label, pick one representative turn per
//! label, extract its voice embedding, and match that embedding against the
//! session's known speakers by cosine similarity. A match above threshold
//! reuses the existing stable id; otherwise a new one is allocated, unless
//! the caller-supplied speaker count hint has already been reached.

use crate::collaborators::{DiarizationTurn, Embedder};
use crate::session::{SessionSpeakers, SessionStore};
use crate::speaker::{cosine_similarity, SpeakerProfile};
use std::collections::HashMap;
use std::path::Path;

/// Minimum similarity to a known speaker's centroid to reuse its id.
const MATCH_THRESHOLD: f32 = 0.60;

/// Representative turns shorter than this are never used for matching;
/// their local label passes through unchanged.
const MIN_DURATION_TO_EMBED: f64 = 0.5;

/// A match is only persisted into the speaker's profile if its
/// representative turn is at least this long, to keep noisy short segments
/// out of the running centroid.
const MIN_DURATION_TO_PERSIST: f64 = 1.5;

/// Fallback label used when the speaker-count hint has already been
/// reached and no existing speaker matched at all — there is no better
/// candidate to fall back to, so the turn is attributed to the first
/// speaker rather than left unlabeled.
const AT_LIMIT_FALLBACK: &str = "SPEAKER_00";

/// Resolve `turns` (all from one chunk, in local diarizer-assigned labels)
/// into session-stable speaker ids, updating and persisting the session's
/// speaker profiles as a side effect.
///
/// Returns `turns` unchanged if it is empty. The session's per-id lock must
/// already be held by the caller for the duration of this call.
pub async fn resolve(
    session_store: &SessionStore,
    session_id: &str,
    audio_path: &Path,
    embedder: &dyn Embedder,
    turns: Vec<DiarizationTurn>,
    num_speakers_hint: Option<u32>,
) -> Vec<DiarizationTurn> {
    if turns.is_empty() {
        return turns;
    }

    let mut profiles = session_store.snapshot(session_id);
    let label_mapping = build_label_mapping(
        &mut profiles,
        audio_path,
        embedder,
        &turns,
        num_speakers_hint,
    )
    .await;
    session_store.replace(session_id, profiles);

    turns
        .into_iter()
        .map(|turn| {
            let mapped = label_mapping
                .get(&turn.local_label)
                .cloned()
                .unwrap_or_else(|| turn.local_label.clone());
            DiarizationTurn {
                local_label: mapped,
                ..turn
            }
        })
        .collect()
}

async fn build_label_mapping(
    profiles: &mut SessionSpeakers,
    audio_path: &Path,
    embedder: &dyn Embedder,
    turns: &[DiarizationTurn],
    num_speakers_hint: Option<u32>,
) -> HashMap<String, String> {
    let mut mapping = HashMap::new();

    for (local_label, representative) in representatives_by_label(turns) {
        let duration = representative.duration();

        if duration < MIN_DURATION_TO_EMBED {
            tracing::debug!(local_label, duration, "segment too short to embed");
            mapping.insert(local_label.clone(), local_label);
            continue;
        }

        let embedding = match embedder
            .embed(audio_path, representative.start, representative.end)
            .await
        {
            Some(e) => e,
            None => {
                tracing::debug!(local_label, "embedding extraction failed");
                mapping.insert(local_label.clone(), local_label);
                continue;
            }
        };

        let (best_match, similarity) = find_matching_speaker(profiles, &embedding);

        if let Some(match_id) = best_match.clone().filter(|_| similarity >= MATCH_THRESHOLD) {
            tracing::debug!(local_label, %match_id, similarity, "matched existing speaker");
            mapping.insert(local_label, match_id.clone());
            if duration >= MIN_DURATION_TO_PERSIST {
                persist_embedding(profiles, &match_id, embedding, duration);
            }
            continue;
        }

        // A hint of 0 is falsy in the original and treated as "no hint",
        // same as `None` here, rather than an active ceiling of zero.
        let at_limit = num_speakers_hint
            .filter(|&hint| hint > 0)
            .map(|hint| profiles.len() >= hint as usize)
            .unwrap_or(false);

        if at_limit {
            let assigned = best_match.unwrap_or_else(|| AT_LIMIT_FALLBACK.to_string());
            tracing::debug!(local_label, %assigned, similarity, "at speaker limit, using best match");
            mapping.insert(local_label, assigned);
        } else {
            let new_id = SessionStore::next_speaker_id(profiles);
            tracing::info!(local_label, new_id, similarity, "new speaker");
            mapping.insert(local_label, new_id.clone());
            if duration >= MIN_DURATION_TO_PERSIST {
                persist_embedding(profiles, &new_id, embedding, duration);
            }
        }
    }

    mapping
}

/// For each distinct local label, the turn with the greatest duration,
/// tie-broken by earliest start. Labels are returned in order of first
/// appearance so the mapping is built deterministically.
fn representatives_by_label(turns: &[DiarizationTurn]) -> Vec<(String, DiarizationTurn)> {
    let mut order = Vec::new();
    let mut best: HashMap<String, DiarizationTurn> = HashMap::new();

    for turn in turns {
        match best.get(&turn.local_label) {
            None => {
                order.push(turn.local_label.clone());
                best.insert(turn.local_label.clone(), turn.clone());
            }
            Some(current) => {
                let better = turn.duration() > current.duration()
                    || (turn.duration() == current.duration() && turn.start < current.start);
                if better {
                    best.insert(turn.local_label.clone(), turn.clone());
                }
            }
        }
    }

    order
        .into_iter()
        .map(|label| {
            let turn = best.remove(&label).expect("label was just inserted");
            (label, turn)
        })
        .collect()
}

/// Best-matching known speaker for `embedding`, by cosine similarity to
/// each speaker's centroid. Iterates speaker ids in sorted order so that
/// ties resolve deterministically.
fn find_matching_speaker(
    profiles: &SessionSpeakers,
    embedding: &[f32],
) -> (Option<String>, f32) {
    let mut speaker_ids: Vec<&String> = profiles.keys().collect();
    speaker_ids.sort();

    let mut best_match = None;
    let mut best_similarity = 0.0f32;

    for speaker_id in speaker_ids {
        let Some(centroid) = profiles[speaker_id].centroid() else {
            continue;
        };
        let similarity = cosine_similarity(embedding, &centroid);
        if similarity > best_similarity {
            best_similarity = similarity;
            best_match = Some(speaker_id.clone());
        }
    }

    (best_match, best_similarity)
}

fn persist_embedding(profiles: &mut SessionSpeakers, speaker_id: &str, embedding: Vec<f32>, duration: f64) {
    profiles
        .entry(speaker_id.to_string())
        .or_insert_with(|| SpeakerProfile::new(speaker_id))
        .add_embedding(embedding, duration);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedEmbedder {
        responses: Mutex<Vec<Option<Vec<f32>>>>,
    }

    impl FixedEmbedder {
        fn new(responses: Vec<Option<Vec<f32>>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _audio_path: &Path, _start: f64, _end: f64) -> Option<Vec<f32>> {
            self.responses.lock().unwrap().remove(0)
        }

        async fn health(&self) -> bool {
            true
        }
    }

    fn turn(label: &str, start: f64, end: f64) -> DiarizationTurn {
        DiarizationTurn {
            local_label: label.to_string(),
            start,
            end,
        }
    }

    #[tokio::test]
    async fn first_speaker_in_empty_session_becomes_speaker_00() {
        let store = SessionStore::new(None);
        let embedder = FixedEmbedder::new(vec![Some(vec![1.0, 0.0])]);
        let turns = vec![turn("SPEAKER_A", 0.0, 3.0)];

        let resolved = resolve(&store, "sess-1", Path::new("chunk.wav"), &embedder, turns, None).await;

        assert_eq!(resolved[0].local_label, "SPEAKER_00");
    }

    #[tokio::test]
    async fn matching_embedding_reuses_existing_speaker_id() {
        let store = SessionStore::new(None);
        let embedder = FixedEmbedder::new(vec![Some(vec![1.0, 0.0])]);
        let first = resolve(
            &store,
            "sess-1",
            Path::new("chunk1.wav"),
            &embedder,
            vec![turn("SPEAKER_A", 0.0, 3.0)],
            None,
        )
        .await;
        assert_eq!(first[0].local_label, "SPEAKER_00");

        let embedder2 = FixedEmbedder::new(vec![Some(vec![0.99, 0.01])]);
        let second = resolve(
            &store,
            "sess-1",
            Path::new("chunk2.wav"),
            &embedder2,
            vec![turn("SPEAKER_X", 0.0, 3.0)],
            None,
        )
        .await;
        assert_eq!(second[0].local_label, "SPEAKER_00");
    }

    #[tokio::test]
    async fn dissimilar_embedding_allocates_a_new_speaker() {
        let store = SessionStore::new(None);
        let embedder = FixedEmbedder::new(vec![Some(vec![1.0, 0.0])]);
        resolve(
            &store,
            "sess-1",
            Path::new("chunk1.wav"),
            &embedder,
            vec![turn("SPEAKER_A", 0.0, 3.0)],
            None,
        )
        .await;

        let embedder2 = FixedEmbedder::new(vec![Some(vec![0.0, 1.0])]);
        let second = resolve(
            &store,
            "sess-1",
            Path::new("chunk2.wav"),
            &embedder2,
            vec![turn("SPEAKER_B", 0.0, 3.0)],
            None,
        )
        .await;
        assert_eq!(second[0].local_label, "SPEAKER_01");
    }

    #[tokio::test]
    async fn short_segment_passes_through_local_label_unmatched() {
        let store = SessionStore::new(None);
        let embedder = FixedEmbedder::new(vec![]);
        let turns = vec![turn("SPEAKER_A", 0.0, 0.2)];

        let resolved = resolve(&store, "sess-1", Path::new("chunk.wav"), &embedder, turns, None).await;
        assert_eq!(resolved[0].local_label, "SPEAKER_A");
    }

    #[tokio::test]
    async fn at_speaker_limit_falls_back_to_sentinel_when_no_match() {
        let store = SessionStore::new(None);
        let embedder = FixedEmbedder::new(vec![Some(vec![1.0, 0.0])]);
        resolve(
            &store,
            "sess-1",
            Path::new("chunk1.wav"),
            &embedder,
            vec![turn("SPEAKER_A", 0.0, 3.0)],
            Some(1),
        )
        .await;

        let embedder2 = FixedEmbedder::new(vec![Some(vec![0.0, 1.0])]);
        let second = resolve(
            &store,
            "sess-1",
            Path::new("chunk2.wav"),
            &embedder2,
            vec![turn("SPEAKER_B", 0.0, 3.0)],
            Some(1),
        )
        .await;

        assert_eq!(second[0].local_label, "SPEAKER_00");
    }

    #[tokio::test]
    async fn zero_num_speakers_hint_is_treated_as_no_hint() {
        // `num_speakers_hint = Some(0)` must not be read as an active
        // ceiling of zero speakers; it behaves like `None`.
        let store = SessionStore::new(None);
        let embedder = FixedEmbedder::new(vec![Some(vec![1.0, 0.0])]);
        let turns = vec![turn("SPEAKER_A", 0.0, 3.0)];

        let resolved = resolve(
            &store,
            "sess-1",
            Path::new("chunk.wav"),
            &embedder,
            turns,
            Some(0),
        )
        .await;

        assert_eq!(resolved[0].local_label, "SPEAKER_00");
        let snapshot = store.snapshot("sess-1");
        assert_eq!(snapshot["SPEAKER_00"].chunk_count(), 1);
    }

    #[tokio::test]
    async fn at_speaker_limit_forces_best_match_below_threshold() {
        // Mirrors S4: two tracked speakers, num_speakers=2, a new local label
        // arrives closer to SPEAKER_01 than SPEAKER_00 but below the match
        // threshold for either. The hint forces it onto the best candidate
        // instead of allocating a third speaker.
        let store = SessionStore::new(None);
        resolve(
            &store,
            "sess-1",
            Path::new("chunk1.wav"),
            &FixedEmbedder::new(vec![Some(vec![1.0, 0.0, 0.0])]),
            vec![turn("A", 0.0, 3.0)],
            None,
        )
        .await;
        resolve(
            &store,
            "sess-1",
            Path::new("chunk2.wav"),
            &FixedEmbedder::new(vec![Some(vec![0.0, 1.0, 0.0])]),
            vec![turn("B", 0.0, 3.0)],
            None,
        )
        .await;

        // similarity ~0.30 to SPEAKER_00's axis, ~0.51 to SPEAKER_01's axis — both below threshold.
        let probe = vec![0.3, 0.5, 0.8];
        let third = resolve(
            &store,
            "sess-1",
            Path::new("chunk3.wav"),
            &FixedEmbedder::new(vec![Some(probe)]),
            vec![turn("C", 0.0, 3.0)],
            Some(2),
        )
        .await;

        assert_eq!(third[0].local_label, "SPEAKER_01");
    }

    #[tokio::test]
    async fn empty_turns_short_circuit_without_touching_the_session() {
        let store = SessionStore::new(None);
        let embedder = FixedEmbedder::new(vec![]);
        let resolved = resolve(&store, "sess-1", Path::new("chunk.wav"), &embedder, vec![], None).await;
        assert!(resolved.is_empty());
    }

    #[test]
    fn representative_picks_longest_then_earliest_start() {
        let turns = vec![
            turn("A", 0.0, 1.0),
            turn("A", 5.0, 7.5),
            turn("A", 1.0, 3.5),
        ];
        let reps = representatives_by_label(&turns);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].1.start, 1.0);
        assert_eq!(reps[0].1.end, 3.5);
    }
}
