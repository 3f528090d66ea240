//! Bridge router
//!
//! Single entry point for script→host messages. It validates the payload
//! shape and hands off to the owning component; it keeps no state of its
//! own and never lets a bad message take down the channel.

use super::export::FileExportHandler;
use super::message::{BridgeMessage, Envelope};
use crate::fetch::FetchProxy;
use crate::notify::{Notice, Notifier};
use crate::script::OutboundQueue;
use crate::speech::PlaybackEngine;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Host UI that owns the widget's on-screen presence
pub trait Presentation: Send + Sync {
    /// The widget library failed to load
    fn on_library_load_error(&self, message: &str);

    /// The widget asked to be closed
    fn close_widget(&self);
}

pub struct BridgeRouter {
    engine: Arc<PlaybackEngine>,
    queue: Arc<OutboundQueue>,
    fetch: Arc<FetchProxy>,
    presentation: Arc<dyn Presentation>,
    export: FileExportHandler,
    notifier: Arc<dyn Notifier>,
}

impl BridgeRouter {
    pub fn new(
        engine: Arc<PlaybackEngine>,
        queue: Arc<OutboundQueue>,
        fetch: Arc<FetchProxy>,
        presentation: Arc<dyn Presentation>,
        export: FileExportHandler,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            engine,
            queue,
            fetch,
            presentation,
            export,
            notifier,
        }
    }

    /// Handle a raw `{"name": ..., "body": ...}` envelope from the page
    pub fn on_ipc(&self, raw: &str) {
        match serde_json::from_str::<Envelope>(raw) {
            Ok(envelope) => self.on_message(&envelope.name, envelope.body),
            Err(e) => warn!("Ignoring malformed bridge envelope: {}", e),
        }
    }

    /// Handle one named message
    pub fn on_message(&self, name: &str, body: Value) {
        let message = match BridgeMessage::parse(name, body) {
            Ok(Some(message)) => message,
            Ok(None) => {
                warn!("Ignoring unknown bridge message: {}", name);
                return;
            }
            Err(e) => {
                warn!("Ignoring bridge message: {}", e);
                return;
            }
        };

        debug!("Bridge message: {}", message.name());
        self.dispatch(message);
    }

    fn dispatch(&self, message: BridgeMessage) {
        match message {
            BridgeMessage::SpeakText(text) => self.engine.speak(text.as_deref()),
            BridgeMessage::SpeakCancel => self.engine.cancel(),
            BridgeMessage::SpeakPause => self.engine.pause(),
            BridgeMessage::SpeakResume => self.engine.resume(),
            BridgeMessage::LibraryLoaded(detail) => {
                info!("Widget library loaded: {}", detail);
                self.queue.on_ready();
            }
            BridgeMessage::LibraryLoadError(detail) => {
                error!("Widget library failed to load: {}", detail);
                self.presentation.on_library_load_error(&detail);
                self.notifier
                    .notify(Notice::error(format!("The help widget could not be loaded: {}", detail)));
            }
            BridgeMessage::HandleFetch {
                request,
                callback_id,
            } => self.fetch.request_json(&request, &callback_id),
            BridgeMessage::SaveFile(request) => {
                // Failures are already logged and surfaced as notices
                let _ = self.export.handle(&request);
            }
            BridgeMessage::CloseBeaconBar => {
                info!("Widget requested close");
                self.presentation.close_widget();
            }
        }
    }
}
