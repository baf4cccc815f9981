//! Global shortcut installation
//!
//! Every reconfiguration clears all OS registrations first, then installs the
//! active bindings in [`ActionId::ALL`] order, so no stale or duplicate
//! registration survives a change.

mod actions;
mod global;

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};

pub use actions::ActionDispatcher;
pub use global::{GlobalHotkeyRegistrar, spawn_event_bridge};

use crate::config::{ActionId, Shortcuts};

/// OS-assigned identifier of a registered combination
pub type HotkeyId = u32;

/// Failures reported by the OS hotkey subsystem
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("unrecognized combination: {0}")]
    Parse(String),

    #[error("already claimed by another application")]
    AlreadyRegistered,

    #[error("{0}")]
    Os(String),
}

#[derive(Debug, Error)]
pub enum ShortcutError {
    /// Registering one combination failed; bindings before it stay installed
    #[error("Failed to register '{combination}' for {action}: {source}")]
    Register {
        action: ActionId,
        combination: String,
        #[source]
        source: RegistrarError,
    },

    #[error("Failed to clear installed shortcuts: {0}")]
    Unregister(#[source] RegistrarError),
}

/// Register/unregister primitives of a global hotkey subsystem
pub trait HotkeyRegistrar {
    fn unregister_all(&mut self) -> Result<(), RegistrarError>;

    /// Register a combination such as `Ctrl+ArrowDown`
    fn register(&mut self, combination: &str) -> Result<HotkeyId, RegistrarError>;
}

/// Keeps the OS registrations in line with the `shortcuts` settings
pub struct ShortcutManager<R> {
    registrar: R,
    installed: HashMap<HotkeyId, ActionId>,
}

impl<R: HotkeyRegistrar> ShortcutManager<R> {
    pub fn new(registrar: R) -> Self {
        Self {
            registrar,
            installed: HashMap::new(),
        }
    }

    /// Replace every installed shortcut with the active bindings in `shortcuts`.
    ///
    /// Returns how many combinations were registered. On a registration
    /// failure the remaining actions are skipped; the ones already registered
    /// in this pass stay installed.
    pub fn apply(&mut self, shortcuts: &Shortcuts) -> Result<usize, ShortcutError> {
        self.registrar
            .unregister_all()
            .map_err(ShortcutError::Unregister)?;
        self.installed.clear();

        for (action, binding) in shortcuts.iter() {
            let Some(combination) = binding.combination() else {
                debug!(action = %action, "Shortcut not bound, skipping");
                continue;
            };

            if !binding.uses_known_keys() {
                warn!(action = %action, combination = %combination, "Shortcut uses keys the settings screen doesn't offer");
            }

            let id = self.registrar.register(&combination).map_err(|source| {
                ShortcutError::Register {
                    action,
                    combination: combination.clone(),
                    source,
                }
            })?;

            debug!(action = %action, combination = %combination, id, "Registered shortcut");
            self.installed.insert(id, action);
        }

        info!(count = self.installed.len(), "Installed global shortcuts");
        Ok(self.installed.len())
    }

    /// Action bound to a fired hotkey, if it is one of ours
    pub fn action_for(&self, id: HotkeyId) -> Option<ActionId> {
        self.installed.get(&id).copied()
    }

    pub fn installed_count(&self) -> usize {
        self.installed.len()
    }
}
