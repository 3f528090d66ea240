//! Recording fakes for the host-side collaborators

#![allow(dead_code)]

use beacon_bridge::bridge::{FileExporter, Presentation};
use beacon_bridge::notify::{Notice, NoticeKind, Notifier};
use beacon_bridge::script::ScriptExecutor;
use beacon_bridge::speech::{Synth, UtteranceToken};
use beacon_bridge::{BridgeError, Result};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthCall {
    Speak(UtteranceToken, String),
    Stop,
    Pause,
    Resume,
    Reinitialize,
    Release,
}

/// Synth that records every call; speak can be made to fail
#[derive(Clone, Default)]
pub struct FakeSynth {
    pub calls: Arc<Mutex<Vec<SynthCall>>>,
    pub fail_speak: Arc<AtomicBool>,
}

impl FakeSynth {
    pub fn calls(&self) -> Vec<SynthCall> {
        self.calls.lock().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                SynthCall::Speak(_, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Synth for FakeSynth {
    fn speak(&mut self, token: UtteranceToken, text: &str) -> Result<()> {
        if self.fail_speak.load(Ordering::SeqCst) {
            return Err(BridgeError::Speech("audio device lost".to_string()));
        }
        self.calls.lock().push(SynthCall::Speak(token, text.to_string()));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.calls.lock().push(SynthCall::Stop);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.calls.lock().push(SynthCall::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.calls.lock().push(SynthCall::Resume);
        Ok(())
    }

    fn reinitialize(&mut self) -> Result<()> {
        self.calls.lock().push(SynthCall::Reinitialize);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.calls.lock().push(SynthCall::Release);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.lock().iter().map(|n| n.kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

#[derive(Default)]
pub struct RecordingExecutor {
    pub scripts: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().clone()
    }
}

impl ScriptExecutor for RecordingExecutor {
    fn evaluate(&self, script: &str) -> Result<()> {
        self.scripts.lock().push(script.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPresentation {
    pub load_errors: Mutex<Vec<String>>,
    pub closed: AtomicBool,
}

impl Presentation for RecordingPresentation {
    fn on_library_load_error(&self, message: &str) {
        self.load_errors.lock().push(message.to_string());
    }

    fn close_widget(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export {
    File { name: String, data: Vec<u8>, mime: String },
    Html { name: String, html: String },
}

#[derive(Default)]
pub struct RecordingExporter {
    pub exports: Mutex<Vec<Export>>,
}

impl FileExporter for RecordingExporter {
    fn save_file(&self, file_name: &str, data: &[u8], mime_type: &str) -> Result<PathBuf> {
        self.exports.lock().push(Export::File {
            name: file_name.to_string(),
            data: data.to_vec(),
            mime: mime_type.to_string(),
        });
        Ok(PathBuf::from(file_name))
    }

    fn export_html_document(&self, file_name: &str, html: &str) -> Result<PathBuf> {
        self.exports.lock().push(Export::Html {
            name: file_name.to_string(),
            html: html.to_string(),
        });
        Ok(PathBuf::from(file_name))
    }
}

/// Poll `check` until it holds or two seconds pass
pub fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    check()
}
