//! Speech synthesizer abstraction
//!
//! The playback engine only needs a handful of capabilities from the
//! platform synthesizer: start an utterance, stop it, pause and resume.
//! Completion comes back asynchronously as a [`SynthEvent`] on a channel.

use crate::config::SpeechSettings;
use crate::Result;
use log::info;
use std::sync::mpsc::{self, Receiver, Sender};

/// Identifies one utterance handed to a synthesizer
///
/// Tokens increase monotonically per engine, so a late event for an
/// utterance that has since been replaced can be recognized and dropped.
pub type UtteranceToken = u64;

/// Events reported by a synthesizer backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthEvent {
    /// The utterance played to its natural end
    Finished(UtteranceToken),
    /// The backend failed outside of a direct call
    Error(String),
}

/// Sending half of a synthesizer's event channel
pub type SynthEventSender = Sender<SynthEvent>;

/// Create the channel a backend uses to report events to the engine
pub fn event_channel() -> (SynthEventSender, Receiver<SynthEvent>) {
    mpsc::channel()
}

/// Speech synthesizer trait
///
/// Backends must report [`SynthEvent::Finished`] for utterances that end on
/// their own, and must not report it for utterances ended by `stop`.
pub trait Synth: Send {
    /// Start speaking `text`, interrupting anything in progress
    fn speak(&mut self, token: UtteranceToken, text: &str) -> Result<()>;

    /// Stop the current utterance immediately
    fn stop(&mut self) -> Result<()>;

    /// Pause the current utterance at the next word boundary
    fn pause(&mut self) -> Result<()>;

    /// Continue a paused utterance
    fn resume(&mut self) -> Result<()>;

    /// Rebuild the audio resource after a failure
    fn reinitialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release any exclusive audio resource held by the backend
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Create a platform-appropriate speech synthesizer
///
/// With the `native-tts` feature the system TTS is tried first; if it is
/// unavailable (or the feature is off) the logging backend is used so the
/// bridge keeps working headless.
pub fn create_synth(events: SynthEventSender, settings: &SpeechSettings) -> Result<Box<dyn Synth>> {
    #[cfg(feature = "native-tts")]
    {
        use super::backends::native::NativeSynth;

        info!("Trying native TTS backend...");
        match NativeSynth::new(events.clone(), settings) {
            Ok(synth) => {
                info!("Initialized native TTS backend");
                return Ok(Box::new(synth));
            }
            Err(e) => {
                info!("Native TTS backend unavailable: {}", e);
            }
        }
    }

    let _ = settings;
    info!("Using logging speech backend");
    Ok(Box::new(super::backends::logging::LogSynth::new(events)))
}
