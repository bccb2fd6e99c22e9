use crate::attribute::assign_speaker;
use crate::timeline::SpeakerTimeline;
use crate::types::{AttributedUtterance, NO_SPEAKER, Transcript, Utterance};

/// Fuses ASR utterances with the diarization timeline into one transcript.
///
/// Every utterance is attributed independently and kept in input order; a
/// failed attribution gets [`NO_SPEAKER`] rather than dropping the utterance.
/// The flat `text` joins every utterance text with single spaces, so it is
/// identical whether attribution succeeded or not.
pub fn fuse(utterances: Vec<Utterance>, timeline: &SpeakerTimeline) -> Transcript {
    let text = utterances
        .iter()
        .map(|u| u.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let utterances = utterances
        .into_iter()
        .map(|u| {
            let speaker =
                assign_speaker(&u, timeline).unwrap_or_else(|| NO_SPEAKER.to_string());
            AttributedUtterance {
                span: u.span,
                text: u.text,
                speaker,
            }
        })
        .collect();

    Transcript { utterances, text }
}
