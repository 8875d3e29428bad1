//! End-to-end speaker-continuity scenarios driving the resolver and merger
//! together through the public API, mirroring the literal S1-S3 and S6
//! scenarios this service is built against.

use async_trait::async_trait;
use speakerkeep::collaborators::{DiarizationTurn, Embedder};
use speakerkeep::merger;
use speakerkeep::resolver::resolve;
use speakerkeep::session::SessionStore;
use std::path::Path;
use std::sync::Mutex;

struct ScriptedEmbedder {
    responses: Mutex<Vec<Option<Vec<f32>>>>,
}

impl ScriptedEmbedder {
    fn new(responses: Vec<Option<Vec<f32>>>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
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
async fn s1_fresh_session_allocates_speaker_00_and_persists() {
    let store = SessionStore::new(None);
    let embedder = ScriptedEmbedder::new(vec![Some(vec![1.0, 0.0])]);

    // Two turns sharing local label A; the 3.0s one is the representative.
    let turns = vec![turn("A", 0.0, 3.0), turn("A", 3.0, 5.0)];
    let resolved = resolve(&store, "meeting-1", Path::new("chunk1.wav"), &embedder, turns, None).await;

    assert!(resolved.iter().all(|t| t.local_label == "SPEAKER_00"));

    let snapshot = store.snapshot("meeting-1");
    let profile = &snapshot["SPEAKER_00"];
    assert_eq!(profile.total_duration(), 3.0);
    assert_eq!(profile.chunk_count(), 1);
}

#[tokio::test]
async fn s2_second_chunk_recognizes_the_same_speaker() {
    let store = SessionStore::new(None);
    resolve(
        &store,
        "meeting-1",
        Path::new("chunk1.wav"),
        &ScriptedEmbedder::new(vec![Some(vec![1.0, 0.0])]),
        vec![turn("A", 0.0, 3.0)],
        None,
    )
    .await;

    // Nearly identical embedding (small noise) on a second, distinct chunk.
    let resolved = resolve(
        &store,
        "meeting-1",
        Path::new("chunk2.wav"),
        &ScriptedEmbedder::new(vec![Some(vec![0.99, 0.02])]),
        vec![turn("X", 0.0, 4.0)],
        None,
    )
    .await;

    assert_eq!(resolved[0].local_label, "SPEAKER_00");

    let snapshot = store.snapshot("meeting-1");
    let profile = &snapshot["SPEAKER_00"];
    assert_eq!(profile.chunk_count(), 2);
    assert_eq!(profile.total_duration(), 7.0);
}

#[tokio::test]
async fn s3_dissimilar_voices_each_get_a_fresh_speaker_id() {
    let store = SessionStore::new(None);
    resolve(
        &store,
        "meeting-1",
        Path::new("chunk1.wav"),
        &ScriptedEmbedder::new(vec![Some(vec![1.0, 0.0, 0.0])]),
        vec![turn("A", 0.0, 3.0)],
        None,
    )
    .await;

    let resolved = resolve(
        &store,
        "meeting-1",
        Path::new("chunk2.wav"),
        &ScriptedEmbedder::new(vec![Some(vec![0.0, 1.0, 0.0]), Some(vec![0.0, 0.0, 1.0])]),
        vec![turn("P", 0.0, 3.0), turn("Q", 5.0, 7.0)],
        None,
    )
    .await;

    assert_eq!(resolved[0].local_label, "SPEAKER_01");
    assert_eq!(resolved[1].local_label, "SPEAKER_02");
}

#[tokio::test]
async fn s6_merge_assigns_speaker_with_greatest_overlap() {
    use speakerkeep::collaborators::TranscriptionSegment;

    let transcript = vec![TranscriptionSegment {
        text: "hello".to_string(),
        start: 1.0,
        end: 3.0,
    }];
    let turns = vec![turn("SPEAKER_00", 0.0, 2.0), turn("SPEAKER_01", 1.8, 4.0)];

    let annotated = merger::merge(transcript, &turns);
    assert_eq!(annotated[0].speaker, "SPEAKER_01");
}

#[tokio::test]
async fn clearing_a_session_forgets_its_speakers() {
    let store = SessionStore::new(None);
    resolve(
        &store,
        "meeting-2",
        Path::new("chunk1.wav"),
        &ScriptedEmbedder::new(vec![Some(vec![1.0, 0.0])]),
        vec![turn("A", 0.0, 3.0)],
        None,
    )
    .await;

    assert!(store.clear("meeting-2"));
    assert!(store.snapshot("meeting-2").is_empty());
}
