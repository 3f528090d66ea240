//! Bridge session
//!
//! A [`Bridge`] lives from widget creation to teardown. It wires the
//! playback engine, outbound queue, fetch proxy and router together around
//! the collaborators supplied by the host.

pub mod export;
pub mod message;
pub mod router;

pub use export::{DirectoryExporter, FileExportHandler, FileExporter};
pub use message::{BridgeMessage, SaveFileRequest};
pub use router::{BridgeRouter, Presentation};

use crate::config::{SpeechSettings, WidgetConfig};
use crate::fetch::{FetchProxy, HttpClient};
use crate::notify::Notifier;
use crate::script::{BootstrapScript, OutboundQueue, ScriptExecutor};
use crate::speech::{PlaybackEngine, Synth, SynthEvent};
use crate::Result;
use log::{debug, info};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Everything the host provides to build a bridge
pub struct BridgeParts {
    /// Runs script in the page on the UI-owning context
    pub executor: Arc<dyn ScriptExecutor>,
    /// Speech synthesizer used by the playback engine
    pub synth: Box<dyn Synth>,
    /// Events from `synth`; when present a pump thread forwards them
    pub synth_events: Option<Receiver<SynthEvent>>,
    pub http: Arc<dyn HttpClient>,
    pub presentation: Arc<dyn Presentation>,
    pub exporter: Arc<dyn FileExporter>,
    pub notifier: Arc<dyn Notifier>,
    /// Runtime the fetch proxy spawns requests on
    pub runtime: Handle,
}

pub struct Bridge {
    config: WidgetConfig,
    executor: Arc<dyn ScriptExecutor>,
    engine: Arc<PlaybackEngine>,
    queue: Arc<OutboundQueue>,
    fetch: Arc<FetchProxy>,
    router: BridgeRouter,
    bootstrapped: AtomicBool,
}

impl Bridge {
    pub fn new(config: WidgetConfig, speech: &SpeechSettings, parts: BridgeParts) -> Result<Self> {
        info!("Creating bridge for org {}", config.org_id);

        let engine = Arc::new(PlaybackEngine::new(
            parts.synth,
            Arc::clone(&parts.notifier),
            speech,
        ));
        if let Some(events) = parts.synth_events {
            engine.start_event_pump(events)?;
        }

        let queue = Arc::new(OutboundQueue::new(Arc::clone(&parts.executor)));
        let fetch = Arc::new(FetchProxy::new(
            parts.http,
            Arc::clone(&queue),
            parts.runtime,
        ));
        let router = BridgeRouter::new(
            Arc::clone(&engine),
            Arc::clone(&queue),
            Arc::clone(&fetch),
            parts.presentation,
            FileExportHandler::new(parts.exporter, Arc::clone(&parts.notifier)),
            parts.notifier,
        );

        Ok(Self {
            config,
            executor: parts.executor,
            engine,
            queue,
            fetch,
            router,
            bootstrapped: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<PlaybackEngine> {
        &self.engine
    }

    pub fn queue(&self) -> &Arc<OutboundQueue> {
        &self.queue
    }

    pub fn fetch(&self) -> &Arc<FetchProxy> {
        &self.fetch
    }

    pub fn router(&self) -> &BridgeRouter {
        &self.router
    }

    /// Inject the bootstrap script the first time the page loads
    ///
    /// Returns whether the script was injected by this call. A failed
    /// injection is retried on the next load.
    pub fn on_page_loaded(&self) -> Result<bool> {
        if self
            .bootstrapped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Bootstrap already injected");
            return Ok(false);
        }

        let injected = BootstrapScript::render(&self.config)
            .and_then(|script| self.executor.evaluate(script.source()));
        match injected {
            Ok(()) => {
                info!("Bootstrap script injected");
                Ok(true)
            }
            Err(e) => {
                self.bootstrapped.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    pub fn on_ipc(&self, raw: &str) {
        self.router.on_ipc(raw);
    }

    pub fn on_message(&self, name: &str, body: Value) {
        self.router.on_message(name, body);
    }

    /// End the session: drop pending script calls, suppress in-flight
    /// fetch responses and stop speech
    pub fn teardown(&self) {
        info!("Tearing down bridge");
        self.fetch.suppress_in_flight();
        self.queue.reset();
        self.engine.shutdown();
    }
}
