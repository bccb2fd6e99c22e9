//! The processed artifact and the naming scheme around it.
//!
//! Object keys and artifact filenames all derive from the audio file's
//! basename cut at the first dot, so `meeting.client.wav` and `meeting.wav`
//! collide on purpose: the short stem is the stable id a recording keeps
//! across raw results, processed results, and the results key in the store.

use std::path::Path;

use courier_transcript::Transcript;

use crate::error::Error;

pub const DATA_PREFIX: &str = "data/";
pub const RESULTS_PREFIX: &str = "results/";

/// One utterance row in the processed artifact, field names fixed by the
/// consumers already reading these files.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UtteranceRow {
    pub start_time: f64,
    pub end_time: f64,
    pub transcript: String,
    pub speaker_id: String,
}

/// What gets written to `results/<stem>_processed_results.json`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProcessedArtifact {
    pub data_id: String,
    pub text: String,
    pub asr_utterance_lvl: Vec<UtteranceRow>,
}

impl ProcessedArtifact {
    pub fn new(data_id: impl Into<String>, transcript: Transcript) -> Self {
        let asr_utterance_lvl = transcript
            .utterances
            .into_iter()
            .map(|u| UtteranceRow {
                start_time: u.span.start,
                end_time: u.span.end,
                transcript: u.text,
                speaker_id: u.speaker,
            })
            .collect();
        Self {
            data_id: data_id.into(),
            text: transcript.text,
            asr_utterance_lvl,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Basename cut at the first dot: `meeting.client.wav` → `meeting`.
pub fn short_stem(filename: &str) -> &str {
    filename.split('.').next().unwrap_or(filename)
}

/// Final path component of an object key: `data/a.wav` → `a.wav`.
pub fn key_basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Where an audio file lives in the store.
///
/// Keys are single-line identifiers (filelists and the status ledger store
/// one per line), so a name that is not valid UTF-8 or contains a line break
/// yields `None`.
pub fn data_key(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if name.contains('\n') {
        return None;
    }
    Some(format!("{DATA_PREFIX}{name}"))
}

/// Where a file's processed artifact lives in the store.
pub fn results_key(filename: &str) -> String {
    format!("{RESULTS_PREFIX}{}", processed_results_name(filename))
}

pub fn raw_results_name(filename: &str) -> String {
    format!("{}_raw_results.json", short_stem(filename))
}

pub fn processed_results_name(filename: &str) -> String {
    format!("{}_processed_results.json", short_stem(filename))
}

#[cfg(test)]
mod tests {
    use courier_transcript::{
        AttributedUtterance, NO_SPEAKER, SpeakerTimeline, TimeSpan, Utterance, fuse,
    };

    use super::*;

    #[test]
    fn stem_cuts_at_the_first_dot() {
        assert_eq!(short_stem("meeting.wav"), "meeting");
        assert_eq!(short_stem("meeting.client.wav"), "meeting");
        assert_eq!(short_stem("noext"), "noext");
    }

    #[test]
    fn keys_follow_the_store_layout() {
        assert_eq!(
            data_key(Path::new("/tmp/audio/meeting.wav")).as_deref(),
            Some("data/meeting.wav")
        );
        assert_eq!(results_key("meeting.wav"), "results/meeting_processed_results.json");
        assert_eq!(raw_results_name("meeting.client.wav"), "meeting_raw_results.json");
        assert_eq!(key_basename("data/meeting.wav"), "meeting.wav");
        assert_eq!(key_basename("meeting.wav"), "meeting.wav");
    }

    #[test]
    fn names_with_line_breaks_cannot_form_keys() {
        assert_eq!(data_key(Path::new("two\nlines.wav")), None);
    }

    #[test]
    fn artifact_rows_mirror_the_transcript() {
        let transcript = Transcript {
            utterances: vec![
                AttributedUtterance {
                    span: TimeSpan::new(0.0, 2.0),
                    text: "good morning".to_string(),
                    speaker: "speaker1".to_string(),
                },
                AttributedUtterance {
                    span: TimeSpan::new(2.0, 3.0),
                    text: "hello".to_string(),
                    speaker: NO_SPEAKER.to_string(),
                },
            ],
            text: "good morning hello".to_string(),
        };

        let artifact = ProcessedArtifact::new("meeting.wav", transcript);
        assert_eq!(artifact.data_id, "meeting.wav");
        assert_eq!(artifact.text, "good morning hello");
        assert_eq!(artifact.asr_utterance_lvl.len(), 2);
        assert_eq!(artifact.asr_utterance_lvl[0].speaker_id, "speaker1");
        assert_eq!(artifact.asr_utterance_lvl[1].speaker_id, NO_SPEAKER);
    }

    #[test]
    fn json_field_names_are_the_wire_contract() {
        let timeline = SpeakerTimeline::new(vec![]);
        let transcript = fuse(
            vec![Utterance {
                span: TimeSpan::new(1.5, 2.5),
                text: "hi".to_string(),
            }],
            &timeline,
        );
        let artifact = ProcessedArtifact::new("a.wav", transcript);

        let value: serde_json::Value =
            serde_json::from_slice(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(value["data_id"], "a.wav");
        assert_eq!(value["text"], "hi");
        let row = &value["asr_utterance_lvl"][0];
        assert_eq!(row["start_time"], 1.5);
        assert_eq!(row["end_time"], 2.5);
        assert_eq!(row["transcript"], "hi");
        assert_eq!(row["speaker_id"], NO_SPEAKER);
    }

    #[test]
    fn artifact_round_trips_through_json() {
        let artifact = ProcessedArtifact {
            data_id: "a.wav".to_string(),
            text: "x".to_string(),
            asr_utterance_lvl: vec![UtteranceRow {
                start_time: 0.0,
                end_time: 1.0,
                transcript: "x".to_string(),
                speaker_id: "speaker1".to_string(),
            }],
        };
        let parsed = ProcessedArtifact::from_json(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(parsed, artifact);
    }
}
