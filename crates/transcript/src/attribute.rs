//! Speaker attribution for a single utterance.
//!
//! ASR utterances and diarization intervals come from two independent passes
//! over the same audio, so their boundaries rarely line up. Attribution picks
//! the speaker whose interval accounts for the largest share of the utterance:
//! an interval containing the whole utterance wins outright, otherwise the
//! partial overlaps on each side compete by contributed duration.

use crate::timeline::SpeakerTimeline;
use crate::types::Utterance;

/// Picks the speaker label for `utterance`, or `None` when no interval shares
/// an endpoint with it.
///
/// Scan rules, in interval start order:
///
/// - both utterance endpoints inside an interval: that speaker, immediately;
/// - only the start inside: candidate contributing `interval.end - utterance.start`;
/// - only the end inside: candidate contributing `utterance.end - interval.start`;
/// - neither: skipped.
///
/// The scan stops once an interval begins after the utterance ends and at
/// least one candidate exists. The largest contribution wins; on a tie the
/// candidate found first keeps the win, which resolves the symmetric case of
/// an utterance straddling a boundary to the earlier speaker.
pub fn assign_speaker(utterance: &Utterance, timeline: &SpeakerTimeline) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;

    for interval in timeline.intervals() {
        if best.is_some() && interval.span.start > utterance.span.end {
            break;
        }

        let start_inside = interval.span.contains(utterance.span.start);
        let end_inside = interval.span.contains(utterance.span.end);

        let contribution = match (start_inside, end_inside) {
            (true, true) => return Some(interval.speaker.clone()),
            (true, false) => interval.span.end - utterance.span.start,
            (false, true) => utterance.span.end - interval.span.start,
            (false, false) => continue,
        };

        match best {
            Some((top, _)) if contribution <= top => {}
            _ => best = Some((contribution, interval.speaker.as_str())),
        }
    }

    best.map(|(_, speaker)| speaker.to_string())
}
