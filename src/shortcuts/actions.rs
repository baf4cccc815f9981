//! What each shortcut does when it fires

use std::sync::Arc;

use tracing::{debug, warn};

use crate::common::constants::resources;
use crate::config::ActionId;
use crate::daemon::WindowControl;
use crate::signals::{Signal, SignalBus};

/// Runs the single effect bound to each action. Failures are logged and
/// never retried.
#[derive(Clone)]
pub struct ActionDispatcher {
    window: Arc<dyn WindowControl>,
    bus: SignalBus,
}

impl ActionDispatcher {
    pub fn new(window: Arc<dyn WindowControl>, bus: SignalBus) -> Self {
        Self { window, bus }
    }

    pub fn dispatch(&self, action: ActionId) {
        debug!(action = %action, "Shortcut fired");

        let result = match action {
            ActionId::HideMeter => self.window.toggle_meter_window(),
            ActionId::ShowLogs => self.window.navigate(resources::LOGS),
            ActionId::ShowLatestEncounter => self.window.open_most_recent_encounter(),
            ActionId::ResetSession => {
                self.bus.broadcast(Signal::ResetRequest);
                Ok(())
            }
            ActionId::PauseSession => {
                self.bus.broadcast(Signal::PauseRequest);
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(action = %action, error = %e, "Shortcut action failed");
        }
    }
}
