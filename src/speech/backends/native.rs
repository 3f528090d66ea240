//! Native Rust TTS backend using the tts crate
//!
//! This backend uses the `tts` crate which provides a unified interface to:
//! - Speech Dispatcher on Linux (via native bindings)
//! - AVFoundation on macOS/iOS (via native bindings)
//! - Various other platforms
//!
//! The tts crate has no pause primitive, so pausing stops the utterance and
//! resuming starts the same unit again from its beginning.

use crate::config::SpeechSettings;
use crate::speech::{Synth, SynthEvent, SynthEventSender, UtteranceToken};
use crate::{BridgeError, Result};
use log::{debug, error, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tts::Tts as TtsCrate;

type Current = Arc<Mutex<Option<(UtteranceToken, String)>>>;

/// Native TTS backend using the tts crate
pub struct NativeSynth {
    /// The tts crate's TTS instance
    tts: TtsCrate,

    /// Where utterance-end callbacks are reported
    events: SynthEventSender,

    /// Utterance currently handed to the tts engine
    current: Current,

    /// Utterance stopped by `pause`, replayed by `resume`
    paused: Option<(UtteranceToken, String)>,

    settings: SpeechSettings,
}

impl NativeSynth {
    /// Create a new native TTS synthesizer
    ///
    /// Initializes the platform-appropriate TTS backend
    pub fn new(events: SynthEventSender, settings: &SpeechSettings) -> Result<Self> {
        debug!("Creating native TTS backend");

        let mut synth = Self {
            tts: Self::open()?,
            events,
            current: Arc::new(Mutex::new(None)),
            paused: None,
            settings: *settings,
        };
        synth.register_callbacks()?;
        synth.apply_settings()?;

        debug!("Native TTS backend created successfully");
        Ok(synth)
    }

    fn open() -> Result<TtsCrate> {
        TtsCrate::default()
            .map_err(|e| BridgeError::Speech(format!("Failed to initialize TTS: {}", e)))
    }

    fn register_callbacks(&mut self) -> Result<()> {
        if !self.tts.supported_features().utterance_callbacks {
            warn!("Utterance callbacks not supported; playback will not auto-advance");
            return Ok(());
        }

        let current = Arc::clone(&self.current);
        let events = self.events.clone();
        self.tts
            .on_utterance_end(Some(Box::new(move |_id| {
                if let Some((token, _)) = current.lock().take() {
                    if events.send(SynthEvent::Finished(token)).is_err() {
                        debug!("Speech event receiver is gone");
                    }
                }
            })))
            .map_err(|e| BridgeError::Speech(format!("Failed to register callback: {}", e)))
    }

    fn apply_settings(&mut self) -> Result<()> {
        let features = self.tts.supported_features();

        if let Some(rate) = self.settings.rate {
            if features.rate {
                let converted = self.convert_rate(rate);
                self.tts
                    .set_rate(converted)
                    .map_err(|e| BridgeError::Speech(format!("Failed to set rate: {}", e)))?;
            } else {
                warn!("Rate control not supported on this platform");
            }
        }

        if let Some(volume) = self.settings.volume {
            if features.volume {
                let converted = self.convert_volume(volume);
                self.tts
                    .set_volume(converted)
                    .map_err(|e| BridgeError::Speech(format!("Failed to set volume: {}", e)))?;
            } else {
                warn!("Volume control not supported on this platform");
            }
        }

        if let Some(idx) = self.settings.voice_idx {
            let voices = self
                .tts
                .voices()
                .map_err(|e| BridgeError::Speech(format!("Failed to get voices: {}", e)))?;
            match voices.get(idx) {
                Some(voice) => {
                    self.tts
                        .set_voice(voice)
                        .map_err(|e| BridgeError::Speech(format!("Failed to set voice: {}", e)))?;
                }
                None => warn!(
                    "Voice index {} out of range (have {} voices)",
                    idx,
                    voices.len()
                ),
            }
        }

        Ok(())
    }

    /// Map a 0-100 rate onto the platform's range
    fn convert_rate(&self, rate: u8) -> f32 {
        let (min, normal, max) = (self.tts.min_rate(), self.tts.normal_rate(), self.tts.max_rate());
        if rate <= 50 {
            min + (normal - min) * (rate as f32 / 50.0)
        } else {
            normal + (max - normal) * ((rate - 50) as f32 / 50.0)
        }
    }

    /// Convert a 0-100 volume to the tts crate's 0.0-1.0
    fn convert_volume(&self, volume: u8) -> f32 {
        volume as f32 / 100.0
    }
}

impl Synth for NativeSynth {
    fn speak(&mut self, token: UtteranceToken, text: &str) -> Result<()> {
        debug!("Speaking: {}", text);
        *self.current.lock() = Some((token, text.to_string()));
        self.tts.speak(text, true).map_err(|e| {
            error!("Failed to speak: {}", e);
            BridgeError::Speech(format!("Speak failed: {}", e))
        })?;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        debug!("Stopping speech");
        self.current.lock().take();
        self.paused = None;
        self.tts.stop().map_err(|e| {
            error!("Failed to stop speech: {}", e);
            BridgeError::Speech(format!("Stop failed: {}", e))
        })?;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        debug!("Pausing speech");
        self.paused = self.current.lock().take();
        self.tts
            .stop()
            .map_err(|e| BridgeError::Speech(format!("Pause failed: {}", e)))?;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        debug!("Resuming speech");
        match self.paused.take() {
            Some((token, text)) => self.speak(token, &text),
            None => Ok(()),
        }
    }

    fn reinitialize(&mut self) -> Result<()> {
        debug!("Reinitializing native TTS backend");
        self.current.lock().take();
        self.paused = None;
        self.tts = Self::open()?;
        self.register_callbacks()?;
        self.apply_settings()
    }

    fn release(&mut self) -> Result<()> {
        debug!("Releasing native TTS backend");
        self.stop()?;
        self.tts
            .on_utterance_end(None)
            .map_err(|e| BridgeError::Speech(format!("Failed to clear callback: {}", e)))
    }
}
