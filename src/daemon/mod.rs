//! Settings daemon - the privileged background process
//!
//! Window processes talk to it through [`IpcDaemonClient`]; the daemon owns the
//! settings file on disk, the meter window's visibility and the encounter
//! session state.

mod client;
mod process;
mod state;

use thiserror::Error;

pub use client::{IpcDaemonClient, spawn_daemon};
pub use process::run_daemon;

/// Errors raised when a request cannot reach the daemon
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The daemon hasn't connected yet, or has gone away
    #[error("Daemon is not connected")]
    Disconnected,

    /// The request could not be serialized or written to the channel
    #[error("Failed to send request to daemon: {0}")]
    Send(String),

    /// The settings document could not be encoded
    #[error("Failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives the settings domain whenever a window changes it
pub trait SettingsSink: Send + Sync {
    fn persist_configuration(&self, settings: &serde_json::Value) -> Result<(), DaemonError>;
}

/// Window and navigation effects owned by the daemon
pub trait WindowControl: Send + Sync {
    fn toggle_meter_window(&self) -> Result<(), DaemonError>;

    /// Open a named resource, e.g. the logs browser
    fn navigate(&self, resource: &str) -> Result<(), DaemonError>;

    fn open_most_recent_encounter(&self) -> Result<(), DaemonError>;
}

#[cfg(test)]
pub mod testing {
    //! Recording stand-in for the daemon

    use parking_lot::Mutex;

    use super::{DaemonError, SettingsSink, WindowControl};
    use crate::common::ipc::DaemonRequest;

    #[derive(Default)]
    pub struct RecordingDaemon {
        requests: Mutex<Vec<DaemonRequest>>,
        fail: bool,
    }

    impl RecordingDaemon {
        /// A daemon that rejects every request
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn requests(&self) -> Vec<DaemonRequest> {
            self.requests.lock().clone()
        }

        /// Settings documents received so far, in order
        pub fn persisted(&self) -> Vec<serde_json::Value> {
            self.requests
                .lock()
                .iter()
                .filter_map(|request| match request {
                    DaemonRequest::PersistSettings(json) => serde_json::from_str(json).ok(),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, request: DaemonRequest) -> Result<(), DaemonError> {
            if self.fail {
                return Err(DaemonError::Disconnected);
            }
            self.requests.lock().push(request);
            Ok(())
        }
    }

    impl SettingsSink for RecordingDaemon {
        fn persist_configuration(&self, settings: &serde_json::Value) -> Result<(), DaemonError> {
            self.record(DaemonRequest::PersistSettings(settings.to_string()))
        }
    }

    impl WindowControl for RecordingDaemon {
        fn toggle_meter_window(&self) -> Result<(), DaemonError> {
            self.record(DaemonRequest::ToggleMeterWindow)
        }

        fn navigate(&self, resource: &str) -> Result<(), DaemonError> {
            self.record(DaemonRequest::Navigate(resource.to_string()))
        }

        fn open_most_recent_encounter(&self) -> Result<(), DaemonError> {
            self.record(DaemonRequest::OpenMostRecentEncounter)
        }
    }
}
