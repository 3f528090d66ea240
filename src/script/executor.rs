//! Script execution seam
//!
//! Evaluating script touches the web view, which belongs to the UI thread.
//! [`ChannelExecutor`] hands scripts to that thread instead of running them
//! wherever the caller happens to be.

use crate::{BridgeError, Result};
use std::sync::mpsc::{self, Receiver, Sender};

/// Something that can run script source in the embedded engine
///
/// Implementations must not block on the script and must not call back into
/// the outbound queue.
pub trait ScriptExecutor: Send + Sync {
    fn evaluate(&self, script: &str) -> Result<()>;
}

/// Executor that forwards scripts to the UI-owning thread over a channel
pub struct ChannelExecutor {
    tx: Sender<String>,
}

impl ChannelExecutor {
    /// Create the executor and the receiver the UI loop drains
    pub fn new() -> (Self, Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl ScriptExecutor for ChannelExecutor {
    fn evaluate(&self, script: &str) -> Result<()> {
        self.tx
            .send(script.to_string())
            .map_err(|_| BridgeError::Script("UI context is gone".to_string()))
    }
}
