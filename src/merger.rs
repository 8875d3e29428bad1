//! Merges transcription segments with resolved diarization turns into the
//! annotated output the API returns.
//!
//! Grounded in `original_source/backend/diarization_service/processor.py`'s
//! `AudioProcessor._merge_results`: for each transcribed segment, find the
//! diarization turn it overlaps the most and attribute the segment to that
//! turn's speaker. A segment with no overlapping turn at all — or when
//! diarization did not run — gets the `UNKNOWN` sentinel.

use crate::collaborators::{AnnotatedSegment, DiarizationTurn, TranscriptionSegment, UNKNOWN_SPEAKER};

/// Combine `transcript` and `turns` into annotated segments. Pure and
/// stateless: the same inputs always produce the same output.
pub fn merge(transcript: Vec<TranscriptionSegment>, turns: &[DiarizationTurn]) -> Vec<AnnotatedSegment> {
    transcript
        .into_iter()
        .map(|segment| {
            let speaker = best_overlapping_speaker(&segment, turns)
                .unwrap_or_else(|| UNKNOWN_SPEAKER.to_string());
            AnnotatedSegment {
                text: segment.text.trim().to_string(),
                start: segment.start,
                end: segment.end,
                speaker,
            }
        })
        .collect()
}

fn best_overlapping_speaker(segment: &TranscriptionSegment, turns: &[DiarizationTurn]) -> Option<String> {
    let mut best_overlap = 0.0f64;
    let mut best_label: Option<&str> = None;

    for turn in turns {
        let overlap = overlap_seconds(segment.start, segment.end, turn.start, turn.end);
        if overlap > best_overlap {
            best_overlap = overlap;
            best_label = Some(&turn.local_label);
        }
    }

    best_label.map(|label| label.to_string())
}

fn overlap_seconds(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    (a_end.min(b_end) - a_start.max(b_start)).max(0.0)
}
