//! Daemon process main loop

use anyhow::{Context, Result};
use ipc_channel::ipc::{self, IpcSender};
use tokio::sync::mpsc;
use tracing::{error, info};

use super::state::DaemonState;
use crate::common::ipc::{BootstrapMessage, DaemonRequest};

/// Connect back to the window process and serve its requests until it
/// disconnects or the daemon is interrupted.
pub async fn run_daemon(ipc_server_name: String) -> Result<()> {
    let mut state = DaemonState::load(DaemonState::default_path());

    info!("Connecting to IPC server: {}", ipc_server_name);
    let bootstrap_sender: IpcSender<BootstrapMessage> =
        IpcSender::connect(ipc_server_name).context("Failed to connect to IPC server")?;

    let (request_tx, request_rx) =
        ipc::channel::<DaemonRequest>().context("Failed to create request IPC channel")?;
    bootstrap_sender
        .send(request_tx)
        .context("Failed to send bootstrap message")?;

    // IpcReceiver::recv blocks, so bridge it onto a tokio channel
    let (bridge_tx, mut requests) = mpsc::channel(32);
    std::thread::spawn(move || {
        while let Ok(request) = request_rx.recv() {
            if bridge_tx.blocking_send(request).is_err() {
                break;
            }
        }
    });

    info!("Settings daemon ready");
    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(request) = request else {
                    info!("Window process disconnected, shutting down");
                    break;
                };
                if let Err(e) = state.handle(request) {
                    error!(error = ?e, "Failed to handle daemon request");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    Ok(())
}
