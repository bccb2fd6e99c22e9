pub mod attribute;
pub mod fuse;
pub mod timeline;
pub mod types;

pub use attribute::assign_speaker;
pub use fuse::fuse;
pub use timeline::SpeakerTimeline;
pub use types::{
    AttributedUtterance, NO_SPEAKER, SpeakerInterval, TimeSpan, Transcript, Utterance,
};
