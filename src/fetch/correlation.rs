//! In-flight fetch tracking
//!
//! Every accepted fetch is recorded by callback id until its response is
//! delivered. Clearing the table on teardown means responses that arrive
//! afterwards find no entry and are dropped instead of reaching a dead page.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::warn;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct CorrelationEntry {
    pub callback_id: String,
    pub created_at: Instant,
}

#[derive(Debug, Default)]
pub struct CorrelationTable {
    entries: DashMap<String, CorrelationEntry>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request; returns false, leaving the existing entry alone,
    /// if the id is already in flight
    pub fn track(&self, callback_id: &str) -> bool {
        match self.entries.entry(callback_id.to_string()) {
            Entry::Occupied(_) => {
                warn!("Callback id {} reused while still in flight", callback_id);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(CorrelationEntry {
                    callback_id: callback_id.to_string(),
                    created_at: Instant::now(),
                });
                true
            }
        }
    }

    /// Remove the entry for a finished request
    pub fn complete(&self, callback_id: &str) -> Option<CorrelationEntry> {
        self.entries.remove(callback_id).map(|(_, entry)| entry)
    }

    /// Forget every in-flight request, returning how many there were
    pub fn clear(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn contains(&self, callback_id: &str) -> bool {
        self.entries.contains_key(callback_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
