//! Sentence-level playback engine
//!
//! Drives one [`Synth`] through the units of a [`Session`]. Public operations
//! and synthesizer events all go through the same mutex, so they may be
//! called from any thread.

use super::segmenter::segment;
use super::session::{Effect, PlaybackState, Session, Utterance};
use super::synth::{Synth, SynthEvent, UtteranceToken};
use crate::config::SpeechSettings;
use crate::notify::{Notice, Notifier};
use crate::Result;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Point-in-time view of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub current_index: usize,
    pub queue_len: usize,
}

struct Core {
    session: Session,
    synth: Box<dyn Synth>,
}

/// Plays text one sentence at a time through a synthesizer
pub struct PlaybackEngine {
    core: Mutex<Core>,
    notifier: Arc<dyn Notifier>,
    unit_gap: Duration,
}

impl PlaybackEngine {
    pub fn new(synth: Box<dyn Synth>, notifier: Arc<dyn Notifier>, settings: &SpeechSettings) -> Self {
        Self {
            core: Mutex::new(Core {
                session: Session::new(),
                synth,
            }),
            notifier,
            unit_gap: settings.unit_gap,
        }
    }

    /// Start speaking `text`, replacing whatever was playing
    ///
    /// Missing or blank text is ignored and leaves the current session alone.
    pub fn speak(&self, text: Option<&str>) {
        let units = segment(text);
        if units.is_empty() {
            debug!("Nothing to speak");
            return;
        }

        info!("Speaking {} units", units.len());
        self.run("speak", |session| session.start(units));
    }

    pub fn pause(&self) {
        self.run("pause", Session::pause);
    }

    pub fn resume(&self) {
        self.run("resume", Session::resume);
    }

    pub fn cancel(&self) {
        self.run("cancel", Session::cancel);
    }

    pub fn skip_next(&self) {
        self.run("skip next", Session::skip_next);
    }

    pub fn skip_previous(&self) {
        self.run("skip previous", Session::skip_previous);
    }

    /// Cancel playback and release the audio resource
    pub fn shutdown(&self) {
        info!("Shutting down playback engine");
        self.cancel();
        if let Err(e) = self.core.lock().synth.release() {
            warn!("Failed to release speech resource: {}", e);
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let core = self.core.lock();
        PlaybackSnapshot {
            state: core.session.state(),
            current_index: core.session.current_index(),
            queue_len: core.session.queue_len(),
        }
    }

    /// Token of the utterance most recently handed to the synthesizer
    pub fn current_token(&self) -> UtteranceToken {
        self.core.lock().session.current_token()
    }

    /// Apply an event reported by the synthesizer
    ///
    /// A `Finished` that advances to another unit waits out the inter-unit
    /// gap on the calling thread before speaking it. Call this from the
    /// event pump (see [`start_event_pump`](Self::start_event_pump)) or
    /// another dedicated thread, never from the UI thread.
    pub fn handle_event(&self, event: SynthEvent) {
        match event {
            SynthEvent::Finished(token) => {
                debug!("Utterance {} finished", token);
                self.run("advance", |session| session.finished(token));
            }
            SynthEvent::Error(message) => {
                let mut core = self.core.lock();
                Self::recover(&mut core, &message);
                drop(core);
                self.notifier.notify(Notice::speech_degraded(message));
            }
        }
    }

    /// Forward events from a synthesizer channel on a background thread
    ///
    /// The thread exits once every sender is gone or the engine is dropped.
    pub fn start_event_pump(self: &Arc<Self>, events: Receiver<SynthEvent>) -> Result<JoinHandle<()>> {
        let engine = Arc::downgrade(self);
        let handle = thread::Builder::new()
            .name("speech-events".to_string())
            .spawn(move || {
                while let Ok(event) = events.recv() {
                    let Some(engine) = engine.upgrade() else {
                        break;
                    };
                    engine.handle_event(event);
                }
                debug!("Speech event pump stopped");
            })?;
        Ok(handle)
    }

    /// Run a session transition and apply its effects to the synthesizer
    fn run(&self, op: &str, transition: impl FnOnce(&mut Session) -> Vec<Effect>) {
        let mut core = self.core.lock();
        let effects = transition(&mut core.session);
        if effects.is_empty() {
            debug!("{}: no-op", op);
            return;
        }

        let scheduled = match Self::apply(&mut core, effects) {
            Ok(scheduled) => scheduled,
            Err(e) => {
                let message = format!("{} failed: {}", op, e);
                Self::recover(&mut core, &message);
                drop(core);
                self.notifier.notify(Notice::speech_degraded(message));
                return;
            }
        };
        drop(core);

        if let Some(next) = scheduled {
            self.play_after_gap(next);
        }
    }

    fn apply(core: &mut Core, effects: Vec<Effect>) -> Result<Option<Utterance>> {
        let mut scheduled = None;
        for effect in effects {
            match effect {
                Effect::Stop => core.synth.stop()?,
                Effect::Pause => core.synth.pause()?,
                Effect::Resume => core.synth.resume()?,
                Effect::Speak(utterance) => {
                    debug!("Speaking unit {}: {}", utterance.index, utterance.text);
                    core.synth.speak(utterance.token, &utterance.text)?;
                }
                Effect::Schedule(utterance) => scheduled = Some(utterance),
            }
        }
        Ok(scheduled)
    }

    /// Wait out the inter-unit gap, then speak `next` if it is still due
    fn play_after_gap(&self, next: Utterance) {
        if !self.unit_gap.is_zero() {
            thread::sleep(self.unit_gap);
        }

        let mut core = self.core.lock();
        let Some(utterance) = core.session.fire_scheduled(next.token) else {
            debug!("Scheduled unit {} was superseded", next.index);
            return;
        };

        debug!("Speaking unit {}: {}", utterance.index, utterance.text);
        if let Err(e) = core.synth.speak(utterance.token, &utterance.text) {
            let message = format!("advance failed: {}", e);
            Self::recover(&mut core, &message);
            drop(core);
            self.notifier.notify(Notice::speech_degraded(message));
        }
    }

    /// Reset to Idle and rebuild the synthesizer after a failure
    fn recover(core: &mut Core, message: &str) {
        error!("Speech synthesizer error: {}", message);
        core.session.reset();
        if let Err(e) = core.synth.reinitialize() {
            error!("Failed to reinitialize speech synthesizer: {}", e);
        }
    }
}
