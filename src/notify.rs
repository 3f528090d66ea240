//! User-facing notifications
//!
//! Components never reach for a global toast or alert facility. The host
//! hands each of them a [`Notifier`] at construction time and decides how
//! notices are shown.

use log::{error, info, warn};

/// What kind of notice is being raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Something finished successfully (e.g. a file was saved)
    Info,
    /// A user-visible failure
    Error,
    /// The speech engine hit a synthesizer failure and reset itself
    SpeechDegraded,
}

/// A single notification for the host UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn speech_degraded(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::SpeechDegraded,
            message: message.into(),
        }
    }
}

/// Sink for notices (toasts, alerts, status lines)
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only writes notices to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Info => info!("notice: {}", notice.message),
            NoticeKind::Error => error!("notice: {}", notice.message),
            NoticeKind::SpeechDegraded => warn!("speech degraded: {}", notice.message),
        }
    }
}
