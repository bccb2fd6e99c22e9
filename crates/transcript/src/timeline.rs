//! Ordered view over a recording's diarization intervals.
//!
//! Diarization engines emit non-overlapping speaker regions, but nothing in
//! their output format promises an ordering. The timeline sorts by start at
//! construction so the two query paths can rely on it: point lookup walks a
//! binary search, and the overlap scan may stop as soon as it has walked past
//! the queried span.

use crate::types::{SpeakerInterval, TimeSpan};

#[derive(Debug, Clone, Default)]
pub struct SpeakerTimeline {
    intervals: Vec<SpeakerInterval>,
}

impl SpeakerTimeline {
    /// Builds a timeline, sorting intervals by their start instant.
    pub fn new(mut intervals: Vec<SpeakerInterval>) -> Self {
        intervals.sort_by(|a, b| a.span.start.total_cmp(&b.span.start));
        Self { intervals }
    }

    pub fn intervals(&self) -> &[SpeakerInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Binary search for the interval containing instant `t`.
    ///
    /// Spans are closed on both ends, so an instant on a shared boundary is
    /// inside both of its neighboring intervals; the search returns whichever
    /// containing interval it tests first. The midpoint rounds down, which
    /// resolves the two-interval boundary case to the earlier interval.
    pub fn speaker_at(&self, t: f64) -> Option<&str> {
        let mut lo = 0usize;
        let mut hi = self.intervals.len();
        while lo < hi {
            let mid = lo + (hi - lo - 1) / 2;
            let interval = &self.intervals[mid];
            if t < interval.span.start {
                hi = mid;
            } else if t > interval.span.end {
                lo = mid + 1;
            } else {
                return Some(interval.speaker.as_str());
            }
        }
        None
    }

    /// Every interval sharing at least one instant with `span`, paired with
    /// the duration of the shared part.
    ///
    /// Linear scan in start order. Once one overlap has been recorded, an
    /// interval starting after `span.end` ends the scan: everything later
    /// starts later still. Before the first hit the scan never exits early.
    pub fn overlapping(&self, span: TimeSpan) -> Vec<(&SpeakerInterval, f64)> {
        let mut hits: Vec<(&SpeakerInterval, f64)> = Vec::new();
        for interval in &self.intervals {
            if !hits.is_empty() && interval.span.start > span.end {
                break;
            }
            let shared = interval.span.end.min(span.end) - interval.span.start.max(span.start);
            if shared >= 0.0 {
                hits.push((interval, shared));
            }
        }
        hits
    }
}
