//! Window-side handle to the daemon process

use std::process::{Child, Command};

use anyhow::{Context, Result};
use ipc_channel::ipc::{IpcOneShotServer, IpcSender};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::{DaemonError, SettingsSink, WindowControl};
use crate::common::ipc::{BootstrapMessage, DaemonRequest};

/// Sends requests to the daemon over its IPC channel.
///
/// Created disconnected so the stores can be built before the daemon has
/// finished starting; requests made before [`connect`](Self::connect) fail
/// with [`DaemonError::Disconnected`].
#[derive(Default)]
pub struct IpcDaemonClient {
    tx: Mutex<Option<IpcSender<DaemonRequest>>>,
}

impl IpcDaemonClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the request channel handed over by the daemon's bootstrap
    pub fn connect(&self, tx: IpcSender<DaemonRequest>) {
        *self.tx.lock() = Some(tx);
        info!("Connected to daemon");
    }

    pub fn reset_session(&self) -> Result<(), DaemonError> {
        self.send(DaemonRequest::ResetSession)
    }

    pub fn pause_session(&self) -> Result<(), DaemonError> {
        self.send(DaemonRequest::PauseSession)
    }

    fn send(&self, request: DaemonRequest) -> Result<(), DaemonError> {
        let guard = self.tx.lock();
        let tx = guard.as_ref().ok_or(DaemonError::Disconnected)?;
        debug!(request = ?request, "Sending daemon request");
        tx.send(request)
            .map_err(|e| DaemonError::Send(e.to_string()))
    }
}

impl SettingsSink for IpcDaemonClient {
    fn persist_configuration(&self, settings: &serde_json::Value) -> Result<(), DaemonError> {
        let json = serde_json::to_string(settings)?;
        self.send(DaemonRequest::PersistSettings(json))
    }
}

impl WindowControl for IpcDaemonClient {
    fn toggle_meter_window(&self) -> Result<(), DaemonError> {
        self.send(DaemonRequest::ToggleMeterWindow)
    }

    fn navigate(&self, resource: &str) -> Result<(), DaemonError> {
        self.send(DaemonRequest::Navigate(resource.to_string()))
    }

    fn open_most_recent_encounter(&self) -> Result<(), DaemonError> {
        self.send(DaemonRequest::OpenMostRecentEncounter)
    }
}

/// Start the daemon as a child of this executable.
///
/// The returned receiver resolves once the daemon has connected back and
/// handed over its request channel.
pub fn spawn_daemon() -> Result<(Child, oneshot::Receiver<BootstrapMessage>)> {
    let (server, server_name) =
        IpcOneShotServer::<BootstrapMessage>::new().context("Failed to create IPC server")?;

    let exe_path = std::env::current_exe().context("Failed to resolve executable path")?;
    let child = Command::new(exe_path)
        .arg("--daemon")
        .arg("--ipc-server")
        .arg(&server_name)
        .spawn()
        .context("Failed to spawn settings daemon")?;
    info!(pid = child.id(), server_name = %server_name, "Started settings daemon");

    // accept() blocks until the daemon connects
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        debug!("Waiting for daemon IPC connection...");
        match server.accept() {
            Ok((_, bootstrap)) => {
                let _ = tx.send(bootstrap);
            }
            Err(e) => {
                error!(error = %e, "Failed to accept daemon IPC connection");
            }
        }
    });

    Ok((child, rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipc_channel::ipc;

    #[test]
    fn test_requests_fail_until_connected() {
        let client = IpcDaemonClient::new();
        assert!(matches!(
            client.toggle_meter_window(),
            Err(DaemonError::Disconnected)
        ));
    }

    #[test]
    fn test_connected_client_sends_requests() {
        let (tx, rx) = ipc::channel::<DaemonRequest>().unwrap();
        let client = IpcDaemonClient::new();
        client.connect(tx);

        client
            .persist_configuration(&serde_json::json!({"general": {"port": 6040}}))
            .unwrap();
        client.navigate("logs").unwrap();
        client.reset_session().unwrap();

        match rx.recv().unwrap() {
            DaemonRequest::PersistSettings(json) => {
                let value: serde_json::Value = serde_json::from_str(&json).unwrap();
                assert_eq!(value["general"]["port"], 6040);
            }
            other => panic!("unexpected request {other:?}"),
        }
        assert_eq!(rx.recv().unwrap(), DaemonRequest::Navigate("logs".to_string()));
        assert_eq!(rx.recv().unwrap(), DaemonRequest::ResetSession);
    }
}
