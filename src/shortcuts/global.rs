//! OS-level registrar backed by the global-hotkey crate
//!
//! Events are read from global-hotkey's own channel on a plain thread, which
//! is enough on Linux/X11. Windows and macOS deliver hotkeys through a
//! platform event loop on the main thread, which this process doesn't run, so
//! registration may succeed there without shortcuts ever firing.

use std::thread::{self, JoinHandle};

use global_hotkey::hotkey::HotKey;
use global_hotkey::{Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{HotkeyId, HotkeyRegistrar, RegistrarError};

pub struct GlobalHotkeyRegistrar {
    manager: GlobalHotKeyManager,
    registered: Vec<HotKey>,
}

impl GlobalHotkeyRegistrar {
    pub fn new() -> Result<Self, RegistrarError> {
        let manager = GlobalHotKeyManager::new().map_err(|e| RegistrarError::Os(e.to_string()))?;
        Ok(Self {
            manager,
            registered: Vec::new(),
        })
    }
}

impl HotkeyRegistrar for GlobalHotkeyRegistrar {
    fn unregister_all(&mut self) -> Result<(), RegistrarError> {
        if self.registered.is_empty() {
            return Ok(());
        }
        self.manager
            .unregister_all(&self.registered)
            .map_err(|e| RegistrarError::Os(e.to_string()))?;
        debug!(count = self.registered.len(), "Unregistered global hotkeys");
        self.registered.clear();
        Ok(())
    }

    fn register(&mut self, combination: &str) -> Result<HotkeyId, RegistrarError> {
        let hotkey = combination
            .parse::<HotKey>()
            .map_err(|e| RegistrarError::Parse(e.to_string()))?;

        match self.manager.register(hotkey) {
            Ok(()) => {
                self.registered.push(hotkey);
                Ok(hotkey.id())
            }
            Err(HotkeyError::AlreadyRegistered(_)) => Err(RegistrarError::AlreadyRegistered),
            Err(e) => Err(RegistrarError::Os(e.to_string())),
        }
    }
}

/// Forward hotkey presses from global-hotkey's blocking receiver to `tx`
pub fn spawn_event_bridge(tx: mpsc::UnboundedSender<HotkeyId>) -> JoinHandle<()> {
    thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();
        loop {
            let event = match receiver.recv() {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "Hotkey event channel closed");
                    break;
                }
            };

            if event.state != HotKeyState::Pressed {
                continue;
            }
            if tx.send(event.id).is_err() {
                break;
            }
        }
    })
}
