//! Keyed observable stores
//!
//! A [`KeyedStore`] wraps one named slot of persisted configuration as a
//! reactive value. Writes go to the durable backend (and, for the settings
//! domain, to the daemon process) before subscribers are notified; writes
//! made by other windows arrive through the backend's change notifications
//! and are applied without being written back.

pub mod backend;
mod error;
pub mod file;
#[cfg(test)]
mod memory;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

pub use backend::{ChangeCallback, DurableBackend};
pub use error::StoreError;
pub use file::FileBackend;
#[cfg(test)]
pub use memory::SharedMemory;

use crate::common::constants::storage;
use crate::daemon::SettingsSink;

/// A configuration domain that can live in a [`KeyedStore`]
pub trait StoreValue:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Rebuild a value from a persisted document.
    ///
    /// Parts of the document that don't fit the current shape are replaced
    /// from `fallback`. The default is all-or-nothing; domains with
    /// independent sub-trees override this to repair them one by one.
    fn restore(document: serde_json::Value, fallback: &Self) -> Self {
        serde_json::from_value(document).unwrap_or_else(|e| {
            warn!(error = %e, "Stored document doesn't match its schema, using fallback");
            fallback.clone()
        })
    }
}

/// Parse a raw document, failing only when it isn't JSON at all
fn decode<T: StoreValue>(key: &str, raw: &str, fallback: &T) -> Result<T, StoreError> {
    let document: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| StoreError::json(key, e))?;
    Ok(T::restore(document, fallback))
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A value waiting to be handed to the listeners registered when it was queued
struct Delivery<T> {
    value: T,
    targets: Vec<(u64, Listener<T>)>,
}

/// Pending deliveries, drained by one caller at a time
struct DeliveryQueue<T> {
    pending: VecDeque<Delivery<T>>,
    draining: bool,
}

/// Lets the next writer take over the queue if a listener panics mid-drain
struct DrainGuard<'a, T>(&'a Mutex<DeliveryQueue<T>>);

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().draining = false;
        }
    }
}

/// Type-erased access to a store's listener list, used by [`Subscription`]
trait ListenerRegistry: Send + Sync {
    fn remove_listener(&self, id: u64);
}

struct StoreShared<T> {
    key: &'static str,
    value: Mutex<T>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_listener: AtomicU64,
    /// Serializes set/update/external changes and the queueing of their
    /// deliveries; never held while notifying
    writes: Mutex<()>,
    deliveries: Mutex<DeliveryQueue<T>>,
    backend: Arc<dyn DurableBackend>,
    /// Present only for the settings domain
    sink: Option<Arc<dyn SettingsSink>>,
}

impl<T: StoreValue> StoreShared<T> {
    /// Write `value` to the backend and forward it to the daemon if needed.
    /// Only the durable write's outcome is returned.
    fn persist(&self, value: &T) -> Result<(), StoreError> {
        let document = serde_json::to_value(value).map_err(|e| StoreError::json(self.key, e))?;

        let written = self.backend.set(self.key, &document.to_string());
        if let Err(e) = &written {
            warn!(key = %self.key, error = %e, "Failed to write durable store, change kept in memory only");
        }

        if let Some(sink) = &self.sink
            && let Err(e) = sink.persist_configuration(&document)
        {
            warn!(key = %self.key, error = %e, "Failed to forward settings to daemon");
        }

        written
    }

    fn mutate(&self, f: impl FnOnce(&T) -> T) -> Result<(), StoreError> {
        let persisted = {
            let _writes = self.writes.lock();
            let current = self.value.lock().clone();
            let value = f(&current);
            let persisted = self.persist(&value);
            *self.value.lock() = value.clone();
            self.enqueue(value);
            persisted
        };

        self.deliver();
        persisted
    }

    /// Apply a document written by another context
    fn apply_external(&self, payload: Option<String>) {
        {
            let _writes = self.writes.lock();
            let decoded = match payload {
                Some(raw) => {
                    let current = self.value.lock().clone();
                    decode(self.key, &raw, &current)
                }
                None => Err(StoreError::MissingPayload(self.key.to_string())),
            };

            match decoded {
                Ok(value) => {
                    *self.value.lock() = value.clone();
                    self.enqueue(value);
                }
                Err(e) => {
                    error!(key = %self.key, error = %e, "Ignoring change notification, keeping last known value");
                    return;
                }
            }
        }

        debug!(key = %self.key, "Applied change from another window");
        self.deliver();
    }

    /// Queue `value` for every current listener. Callers hold `writes`, so
    /// the queue order is the write order.
    fn enqueue(&self, value: T) {
        let targets = self.listeners.lock().clone();
        self.deliveries
            .lock()
            .pending
            .push_back(Delivery { value, targets });
    }

    /// Run queued deliveries in order.
    ///
    /// Only one caller drains at a time; anything queued meanwhile, by a
    /// listener or by another thread, is delivered by that same drain, so no
    /// listener sees an older value after a newer one.
    fn deliver(&self) {
        {
            let mut queue = self.deliveries.lock();
            if queue.draining {
                return;
            }
            queue.draining = true;
        }
        let _guard = DrainGuard(&self.deliveries);

        loop {
            let delivery = {
                let mut queue = self.deliveries.lock();
                match queue.pending.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        queue.draining = false;
                        return;
                    }
                }
            };

            for (id, listener) in delivery.targets {
                if self.is_subscribed(id) {
                    listener(&delivery.value);
                }
            }
        }
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.listeners.lock().iter().any(|(existing, _)| *existing == id)
    }
}

impl<T: StoreValue> ListenerRegistry for StoreShared<T> {
    fn remove_listener(&self, id: u64) {
        self.listeners.lock().retain(|(existing, _)| *existing != id);
    }
}

/// Resolve the initial value: persisted document if readable, else `default`
fn load_initial<T: StoreValue>(key: &str, default: T, backend: &dyn DurableBackend) -> T {
    match backend.get(key) {
        Ok(Some(raw)) => match decode(key, &raw, &default) {
            Ok(value) => {
                debug!(key = %key, "Loaded persisted value");
                value
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Persisted value is corrupt, using default");
                default
            }
        },
        Ok(None) => {
            debug!(key = %key, "No persisted value, using default");
            default
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to read persisted value, using default");
            default
        }
    }
}

/// A persisted, observable configuration value
pub struct KeyedStore<T> {
    shared: Arc<StoreShared<T>>,
}

impl<T> Clone for KeyedStore<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: StoreValue> KeyedStore<T> {
    /// Load `key` from `backend` (or use `default`) and start watching it.
    ///
    /// `sink` is only used when `key` is the settings domain.
    pub fn new(
        key: &'static str,
        default: T,
        backend: Arc<dyn DurableBackend>,
        sink: Arc<dyn SettingsSink>,
    ) -> Self {
        let initial = load_initial(key, default, backend.as_ref());
        let sink = (key == storage::SETTINGS_KEY).then_some(sink);

        let shared = Arc::new(StoreShared {
            key,
            value: Mutex::new(initial),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            writes: Mutex::new(()),
            deliveries: Mutex::new(DeliveryQueue {
                pending: VecDeque::new(),
                draining: false,
            }),
            backend,
            sink,
        });

        let weak = Arc::downgrade(&shared);
        let callback: ChangeCallback = Arc::new(move |payload: Option<String>| {
            if let Some(shared) = weak.upgrade() {
                shared.apply_external(payload);
            }
        });
        if let Err(e) = shared.backend.on_change(key, callback) {
            warn!(key = %key, error = %e, "Changes made in other windows will not be observed");
        }

        Self { shared }
    }

    #[cfg(test)]
    pub fn key(&self) -> &'static str {
        self.shared.key
    }

    /// Current in-memory value
    pub fn get_snapshot(&self) -> T {
        self.shared.value.lock().clone()
    }

    /// Register `listener` for every subsequent value. It is first called
    /// with the current value: right away, or once the values already queued
    /// have been delivered when subscribing from inside a listener.
    ///
    /// Must not be called from an [`update`](Self::update) closure.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let listener: Listener<T> = Arc::new(listener);
        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        {
            let _writes = self.shared.writes.lock();
            self.shared
                .listeners
                .lock()
                .push((id, Arc::clone(&listener)));
            let current = self.shared.value.lock().clone();
            self.shared.deliveries.lock().pending.push_back(Delivery {
                value: current,
                targets: vec![(id, listener)],
            });
        }
        self.shared.deliver();

        let registry: Weak<StoreShared<T>> = Arc::downgrade(&self.shared);
        let registry: Weak<dyn ListenerRegistry> = registry;
        Subscription {
            registry,
            id,
            active: true,
        }
    }

    /// Replace the value.
    ///
    /// Subscribers always see the new value; an error means it could not be
    /// made durable and only lives in memory until the next successful write.
    pub fn set(&self, value: T) -> Result<(), StoreError> {
        self.shared.mutate(move |_| value)
    }

    /// Replace the value with `f(current)`.
    ///
    /// `f` runs while other writes to this store are held off and must not
    /// call back into the store.
    pub fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&T) -> T,
    {
        self.shared.mutate(f)
    }
}

/// Handle for a store listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    registry: Weak<dyn ListenerRegistry>,
    id: u64,
    active: bool,
}

impl Subscription {
    #[cfg(test)]
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Keep the listener registered for as long as the store lives
    pub fn detach(mut self) {
        self.active = false;
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_listener(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
