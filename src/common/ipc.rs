use ipc_channel::ipc::IpcSender;
use serde::{Deserialize, Serialize};

/// Requests sent from a window process to the daemon process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaemonRequest {
    /// Persist the full settings document (JSON text; ipc-channel's bincode
    /// transport cannot carry a self-describing `serde_json::Value`)
    PersistSettings(String),
    /// Show or hide the meter window
    ToggleMeterWindow,
    /// Open a resource such as the logs browser
    Navigate(String),
    /// Open the most recently recorded encounter
    OpenMostRecentEncounter,
    /// Soft-reset the current encounter
    ResetSession,
    /// Toggle encounter tracking pause
    PauseSession,
}

/// The bootstrap payload sent over the initial server channel.
/// Carries the channel the window process uses for all further requests.
pub type BootstrapMessage = IpcSender<DaemonRequest>;
