//! Speech synthesis and sentence-level playback

pub mod backends;
pub mod engine;
pub mod segmenter;
pub mod session;
pub mod synth;

pub use engine::{PlaybackEngine, PlaybackSnapshot};
pub use segmenter::segment;
pub use session::PlaybackState;
pub use synth::{create_synth, event_channel, Synth, SynthEvent, SynthEventSender, UtteranceToken};
