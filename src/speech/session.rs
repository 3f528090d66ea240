//! Playback session state machine
//!
//! A [`Session`] owns the unit queue and the playback flags. Every operation
//! mutates the session and returns the [`Effect`]s the engine must apply to
//! the synthesizer, so the transitions can be exercised without any audio.

use super::synth::UtteranceToken;

/// Externally visible playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
    Paused,
}

/// A unit ready to be handed to the synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub token: UtteranceToken,
    pub index: usize,
    pub text: String,
}

/// Synthesizer work produced by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Stop,
    Pause,
    Resume,
    /// Start this utterance now
    Speak(Utterance),
    /// Start this utterance after the inter-unit gap, if still scheduled
    Schedule(Utterance),
}

/// Queue and flags for one playback session
#[derive(Debug, Default)]
pub struct Session {
    queue: Vec<String>,
    current_index: usize,
    speaking: bool,
    paused: bool,
    /// The synthesizer holds an utterance (playing or paused)
    live: bool,
    /// Token of the current utterance
    token: UtteranceToken,
    /// Token waiting out the inter-unit gap
    scheduled: Option<UtteranceToken>,
    /// Source of fresh tokens, survives session replacement
    next_token: UtteranceToken,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        match (self.speaking, self.paused) {
            (false, _) => PlaybackState::Idle,
            (true, false) => PlaybackState::Speaking,
            (true, true) => PlaybackState::Paused,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn current_token(&self) -> UtteranceToken {
        self.token
    }

    /// Replace the session with a fresh one over `units` and play unit 0
    ///
    /// An empty `units` leaves the session untouched.
    pub fn start(&mut self, units: Vec<String>) -> Vec<Effect> {
        if units.is_empty() {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if self.live {
            effects.push(Effect::Stop);
        }

        self.queue = units;
        self.current_index = 0;
        self.speaking = true;
        self.paused = false;
        self.scheduled = None;
        effects.push(Effect::Speak(self.begin_current()));
        self.check();
        effects
    }

    pub fn pause(&mut self) -> Vec<Effect> {
        if !self.speaking || self.paused {
            return Vec::new();
        }

        self.paused = true;
        self.scheduled = None;
        self.check();
        if self.live {
            vec![Effect::Pause]
        } else {
            Vec::new()
        }
    }

    pub fn resume(&mut self) -> Vec<Effect> {
        if !self.paused {
            return Vec::new();
        }

        self.paused = false;
        let effects = if self.live {
            vec![Effect::Resume]
        } else if self.current_index < self.queue.len() {
            vec![Effect::Speak(self.begin_current())]
        } else {
            Vec::new()
        };
        self.check();
        effects
    }

    /// Stop everything and clear the queue
    pub fn cancel(&mut self) -> Vec<Effect> {
        self.reset();
        vec![Effect::Stop]
    }

    /// Drop back to Idle without touching the synthesizer
    pub fn reset(&mut self) {
        self.queue.clear();
        self.current_index = 0;
        self.speaking = false;
        self.paused = false;
        self.live = false;
        self.scheduled = None;
        self.check();
    }

    pub fn skip_next(&mut self) -> Vec<Effect> {
        if self.current_index + 1 >= self.queue.len() {
            return Vec::new();
        }
        self.skip_to(self.current_index + 1)
    }

    pub fn skip_previous(&mut self) -> Vec<Effect> {
        if self.current_index == 0 {
            return Vec::new();
        }
        self.skip_to(self.current_index - 1)
    }

    /// Move to `index`; an ended or cancelled session does not move
    fn skip_to(&mut self, index: usize) -> Vec<Effect> {
        if !self.speaking {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if self.live {
            effects.push(Effect::Stop);
        }

        self.live = false;
        self.scheduled = None;
        self.current_index = index;
        if !self.paused {
            effects.push(Effect::Speak(self.begin_current()));
        }
        self.check();
        effects
    }

    /// The synthesizer finished the utterance identified by `token`
    pub fn finished(&mut self, token: UtteranceToken) -> Vec<Effect> {
        if !self.speaking || !self.live || token != self.token {
            return Vec::new();
        }

        self.live = false;
        let effects = if self.current_index + 1 < self.queue.len() {
            self.current_index += 1;
            if self.paused {
                Vec::new()
            } else {
                let next = self.next_utterance();
                self.scheduled = Some(next.token);
                vec![Effect::Schedule(next)]
            }
        } else {
            self.current_index = self.queue.len();
            self.speaking = false;
            self.paused = false;
            Vec::new()
        };
        self.check();
        effects
    }

    /// The inter-unit gap for `token` elapsed
    ///
    /// Returns the utterance to speak if nothing changed in the meantime.
    pub fn fire_scheduled(&mut self, token: UtteranceToken) -> Option<Utterance> {
        if self.scheduled != Some(token) || !self.speaking || self.paused {
            return None;
        }

        self.scheduled = None;
        self.live = true;
        self.queue.get(self.current_index).map(|text| Utterance {
            token,
            index: self.current_index,
            text: text.clone(),
        })
    }

    fn next_utterance(&mut self) -> Utterance {
        self.next_token += 1;
        self.token = self.next_token;
        Utterance {
            token: self.token,
            index: self.current_index,
            text: self.queue[self.current_index].clone(),
        }
    }

    fn begin_current(&mut self) -> Utterance {
        self.live = true;
        self.next_utterance()
    }

    fn check(&self) {
        debug_assert!(self.current_index <= self.queue.len());
        debug_assert!(self.speaking || !self.paused);
    }
}
