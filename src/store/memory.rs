//! In-memory durable backend
//!
//! Several execution contexts (e.g. windows embedded in one process) share a
//! [`SharedMemory`]; each gets its own [`MemoryBackend`] handle. A write made
//! through one handle is delivered to the watchers registered through every
//! other handle, mirroring how browser storage events reach all windows except
//! the writer.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::backend::{ChangeCallback, DurableBackend};
use super::StoreError;

struct Watch {
    context: u64,
    key: String,
    callback: ChangeCallback,
}

#[derive(Default)]
struct MemoryState {
    entries: HashMap<String, String>,
    watches: Vec<Watch>,
    write_counts: HashMap<String, usize>,
    next_context: u64,
}

/// Storage shared by every context created from it
#[derive(Default)]
pub struct SharedMemory {
    state: Mutex<MemoryState>,
}

impl SharedMemory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a handle for a new execution context
    pub fn context(self: &Arc<Self>) -> MemoryBackend {
        let mut state = self.state.lock();
        let context = state.next_context;
        state.next_context += 1;
        MemoryBackend {
            memory: Arc::clone(self),
            context,
        }
    }

    /// Number of writes to `key` across all contexts
    pub fn write_count(&self, key: &str) -> usize {
        self.state.lock().write_counts.get(key).copied().unwrap_or(0)
    }

    /// Raw document currently stored under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.state.lock().entries.get(key).cloned()
    }

    /// Store a document without notifying anyone (seeding before startup)
    pub fn seed(&self, key: &str, value: &str) {
        self.state
            .lock()
            .entries
            .insert(key.to_string(), value.to_string());
    }
}

/// One context's view of a [`SharedMemory`]
pub struct MemoryBackend {
    memory: Arc<SharedMemory>,
    context: u64,
}

impl DurableBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.memory.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // Collect callbacks under the lock, invoke them after releasing it so a
        // watcher may read the backend
        let callbacks: Vec<ChangeCallback> = {
            let mut state = self.memory.state.lock();
            state.entries.insert(key.to_string(), value.to_string());
            *state.write_counts.entry(key.to_string()).or_insert(0) += 1;
            state
                .watches
                .iter()
                .filter(|watch| watch.key == key && watch.context != self.context)
                .map(|watch| Arc::clone(&watch.callback))
                .collect()
        };

        debug!(key = %key, context = self.context, watchers = callbacks.len(), "Broadcasting memory store write");
        for callback in callbacks {
            callback(Some(value.to_string()));
        }
        Ok(())
    }

    fn on_change(&self, key: &str, callback: ChangeCallback) -> Result<(), StoreError> {
        self.memory.state.lock().watches.push(Watch {
            context: self.context,
            key: key.to_string(),
            callback,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let memory = SharedMemory::new();
        let backend = memory.context();
        assert_eq!(backend.get("settings").unwrap(), None);
    }

    #[test]
    fn test_writes_reach_other_contexts_only() {
        let memory = SharedMemory::new();
        let a = memory.context();
        let b = memory.context();

        let seen_by_a = Arc::new(Mutex::new(Vec::new()));
        let seen_by_b = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen_by_a);
        a.on_change("settings", Arc::new(move |v: Option<String>| sink.lock().push(v)))
            .unwrap();
        let sink = Arc::clone(&seen_by_b);
        b.on_change("settings", Arc::new(move |v: Option<String>| sink.lock().push(v)))
            .unwrap();

        a.set("settings", "{\"a\":1}").unwrap();

        assert!(seen_by_a.lock().is_empty());
        assert_eq!(*seen_by_b.lock(), vec![Some("{\"a\":1}".to_string())]);
        assert_eq!(b.get("settings").unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(memory.write_count("settings"), 1);
    }

    #[test]
    fn test_watch_is_scoped_to_key() {
        let memory = SharedMemory::new();
        let a = memory.context();
        let b = memory.context();

        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        b.on_change("classColors", Arc::new(move |_: Option<String>| *counter.lock() += 1))
            .unwrap();

        a.set("settings", "{}").unwrap();
        assert_eq!(*seen.lock(), 0);

        a.set("classColors", "{}").unwrap();
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_seed_does_not_notify() {
        let memory = SharedMemory::new();
        let a = memory.context();
        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        a.on_change("skillIcon", Arc::new(move |_: Option<String>| *counter.lock() += 1))
            .unwrap();

        memory.seed("skillIcon", "{}");

        assert_eq!(*seen.lock(), 0);
        assert_eq!(memory.write_count("skillIcon"), 0);
        assert_eq!(a.get("skillIcon").unwrap().as_deref(), Some("{}"));
    }
}
