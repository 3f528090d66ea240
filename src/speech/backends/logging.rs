//! Logging speech backend
//!
//! Used when no system synthesizer is available (CI, containers, headless
//! hosts). Each unit is written to the log and reported as finished right
//! away, so playback still walks the whole queue.

use crate::speech::{Synth, SynthEvent, SynthEventSender, UtteranceToken};
use crate::Result;
use log::{debug, info};

pub struct LogSynth {
    events: SynthEventSender,
}

impl LogSynth {
    pub fn new(events: SynthEventSender) -> Self {
        Self { events }
    }
}

impl Synth for LogSynth {
    fn speak(&mut self, token: UtteranceToken, text: &str) -> Result<()> {
        info!("speak: {}", text);
        if self.events.send(SynthEvent::Finished(token)).is_err() {
            debug!("Speech event receiver is gone");
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        debug!("stop");
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        debug!("pause");
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        debug!("resume");
        Ok(())
    }
}
