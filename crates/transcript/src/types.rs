/// Speaker label attached to an utterance no diarization interval claims.
///
/// Downstream consumers of the processed artifact match on this exact string,
/// so it is part of the output contract, not a display placeholder.
pub const NO_SPEAKER: &str = "No Speaker Found to Attribute!";

/// A closed interval of time in seconds. Both endpoints are inside the span,
/// so `start == end` is a valid zero-duration span containing exactly that
/// instant. Diarization and ASR engines both emit boundary-sharing regions
/// (one ends at `t`, the next starts at `t`), and the closed-closed reading
/// is what makes those boundary instants attributable at all.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One diarization interval: who was speaking, and when.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpeakerInterval {
    pub span: TimeSpan,
    pub speaker: String,
}

/// One ASR utterance, not yet attributed to a speaker.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Utterance {
    pub span: TimeSpan,
    pub text: String,
}

/// An utterance after speaker attribution. `speaker` is either a diarization
/// label or [`NO_SPEAKER`]; fusion never drops an utterance.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttributedUtterance {
    pub span: TimeSpan,
    pub text: String,
    pub speaker: String,
}

/// The fused result for one recording: every utterance in time order with a
/// speaker label, plus the flat space-joined text of the whole recording.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transcript {
    pub utterances: Vec<AttributedUtterance>,
    pub text: String,
}
