use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the keyed stores and their durable backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a persisted document failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be (de)serialized
    #[error("Invalid JSON for key '{key}': {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A change notification arrived without a document
    #[error("Change notification for key '{0}' carried no value")]
    MissingPayload(String),

    /// The change watcher could not be installed
    #[error("Failed to watch for changes: {0}")]
    Watch(#[from] notify::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(key: &str, source: serde_json::Error) -> Self {
        Self::Json {
            key: key.to_string(),
            source,
        }
    }
}
