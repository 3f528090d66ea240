//! Outbound action queue
//!
//! Host→script calls are only safe once the widget library has loaded.
//! Until then they are buffered here and flushed, in submission order, when
//! the page reports readiness.
//!
//! Each [`reset`](OutboundQueue::reset) starts a new epoch. Work that began
//! in an earlier epoch delivers through [`deliver_in`](OutboundQueue::deliver_in)
//! and is dropped once the page it was meant for is gone.

use super::action::ScriptAction;
use super::executor::ScriptExecutor;
use log::{debug, error, info};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct QueueState {
    ready: bool,
    epoch: u64,
    pending: VecDeque<ScriptAction>,
}

/// Orders and defers native→script calls
pub struct OutboundQueue {
    state: Mutex<QueueState>,
    executor: Arc<dyn ScriptExecutor>,
}

impl OutboundQueue {
    pub fn new(executor: Arc<dyn ScriptExecutor>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            executor,
        }
    }

    /// Execute `action` now if the runtime is ready, otherwise buffer it
    pub fn deliver(&self, action: ScriptAction) {
        let mut state = self.state.lock();
        if state.ready {
            self.execute(&action);
        } else {
            debug!("Runtime not ready, buffering action ({} pending)", state.pending.len() + 1);
            state.pending.push_back(action);
        }
    }

    /// Deliver `action` only if no reset happened since `epoch` was read
    ///
    /// The epoch check and the buffering happen under one lock, so a
    /// concurrent reset either discards the action or precedes the check.
    pub fn deliver_in(&self, epoch: u64, action: ScriptAction) -> bool {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            debug!("Dropping action from epoch {} (now {})", epoch, state.epoch);
            return false;
        }
        if state.ready {
            self.execute(&action);
        } else {
            state.pending.push_back(action);
        }
        true
    }

    /// Current epoch, to be passed to [`deliver_in`](Self::deliver_in) later
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Mark the runtime ready and flush everything buffered so far
    pub fn on_ready(&self) {
        let mut state = self.state.lock();
        state.ready = true;
        let pending = std::mem::take(&mut state.pending);
        info!("Script runtime ready, flushing {} actions", pending.len());
        // Lock stays held so a concurrent deliver cannot overtake the flush
        for action in &pending {
            self.execute(action);
        }
    }

    /// Drop buffered actions without running them and return to not-ready
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let dropped = state.pending.len();
        state.pending.clear();
        state.ready = false;
        state.epoch += 1;
        info!("Outbound queue reset, discarded {} actions", dropped);
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn execute(&self, action: &ScriptAction) {
        if let Err(e) = self.executor.evaluate(&action.to_script()) {
            error!("Failed to execute script action: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    #[derive(Default)]
    struct Recorder {
        scripts: Mutex<Vec<String>>,
    }

    impl ScriptExecutor for Recorder {
        fn evaluate(&self, script: &str) -> Result<()> {
            self.scripts.lock().push(script.to_string());
            Ok(())
        }
    }

    fn raw(n: usize) -> ScriptAction {
        ScriptAction::Raw(format!("step({});", n))
    }

    fn setup() -> (Arc<Recorder>, OutboundQueue) {
        let recorder = Arc::new(Recorder::default());
        let queue = OutboundQueue::new(recorder.clone());
        (recorder, queue)
    }

    #[test]
    fn test_buffers_until_ready() {
        let (recorder, queue) = setup();
        queue.deliver(raw(1));
        queue.deliver(raw(2));
        assert!(recorder.scripts.lock().is_empty());
        assert_eq!(queue.pending_len(), 2);

        queue.on_ready();
        assert_eq!(*recorder.scripts.lock(), vec!["step(1);", "step(2);"]);
        assert_eq!(queue.pending_len(), 0);

        queue.deliver(raw(3));
        assert_eq!(recorder.scripts.lock().len(), 3);
        assert_eq!(recorder.scripts.lock()[2], "step(3);");
    }

    #[test]
    fn test_ready_twice_does_not_replay() {
        let (recorder, queue) = setup();
        queue.deliver(raw(1));
        queue.on_ready();
        queue.on_ready();
        assert_eq!(recorder.scripts.lock().len(), 1);
    }

    #[test]
    fn test_reset_discards() {
        let (recorder, queue) = setup();
        queue.deliver(raw(1));
        queue.reset();
        queue.on_ready();
        assert!(recorder.scripts.lock().is_empty());
    }

    #[test]
    fn test_reset_after_ready() {
        let (recorder, queue) = setup();
        queue.on_ready();
        queue.reset();
        assert!(!queue.is_ready());
        queue.deliver(raw(1));
        assert!(recorder.scripts.lock().is_empty());
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn test_stale_epoch_is_dropped() {
        let (recorder, queue) = setup();
        let epoch = queue.epoch();
        queue.reset();

        assert!(!queue.deliver_in(epoch, raw(1)));
        assert_eq!(queue.pending_len(), 0);
        queue.on_ready();
        assert!(recorder.scripts.lock().is_empty());

        assert!(queue.deliver_in(queue.epoch(), raw(2)));
        assert_eq!(*recorder.scripts.lock(), vec!["step(2);"]);
    }

    #[test]
    fn test_current_epoch_buffers_until_ready() {
        let (recorder, queue) = setup();
        let epoch = queue.epoch();
        assert!(queue.deliver_in(epoch, raw(1)));
        assert_eq!(queue.pending_len(), 1);

        // A reset after buffering still discards it
        queue.reset();
        queue.on_ready();
        assert!(recorder.scripts.lock().is_empty());
    }
}
