//! Durable key-value backend abstraction
//!
//! A backend stores one serialized document per key and tells interested
//! execution contexts when another context overwrote one of them.
//! Currently supports:
//! - JSON files in a directory, watched with notify (one per window process)
//! - in-memory storage shared between contexts of one process (tests, embedding)

use std::sync::Arc;

use super::StoreError;

/// Callback invoked with the new raw document when another context changed a key.
/// `None` means the document disappeared.
pub type ChangeCallback = Arc<dyn Fn(Option<String>) + Send + Sync>;

/// Durable storage shared by every window of the application
pub trait DurableBackend: Send + Sync {
    /// Read the raw document stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the raw document stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Watch `key` for writes made by other contexts
    ///
    /// Writes made through this backend instance are never reported back to it.
    fn on_change(&self, key: &str, callback: ChangeCallback) -> Result<(), StoreError>;
}
