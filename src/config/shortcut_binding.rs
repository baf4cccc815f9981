//! Shortcut bindings and the actions they trigger

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::constants::{defaults, keys};

/// A modifier + key combination, either of which may be empty.
/// Serializes as `{"modifier": "Ctrl", "key": "ArrowDown"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutBinding {
    pub modifier: String,
    pub key: String,
}

impl ShortcutBinding {
    pub fn new(modifier: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            modifier: modifier.into(),
            key: key.into(),
        }
    }

    /// A binding with neither modifier nor key
    pub fn unbound() -> Self {
        Self::default()
    }

    fn from_pair((modifier, key): (&str, &str)) -> Self {
        Self::new(modifier, key)
    }

    /// Only bindings with both a modifier and a key get registered
    pub fn is_active(&self) -> bool {
        !self.modifier.is_empty() && !self.key.is_empty()
    }

    /// OS-level combination string, e.g. `Ctrl+ArrowDown`
    pub fn combination(&self) -> Option<String> {
        self.is_active()
            .then(|| format!("{}{}{}", self.modifier, keys::SEPARATOR, self.key))
    }

    /// Get human-readable display name for this binding (for UI)
    pub fn display_name(&self) -> String {
        self.combination().unwrap_or_else(|| "Unbound".to_string())
    }

    /// Whether both parts come from the vocabulary the settings screen offers
    pub fn uses_known_keys(&self) -> bool {
        is_known_modifier(&self.modifier) && is_known_key(&self.key)
    }
}

impl fmt::Display for ShortcutBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Parse `Modifier+Key`, e.g. `Ctrl+F1`
impl FromStr for ShortcutBinding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (modifier, key) = s
            .split_once(keys::SEPARATOR)
            .ok_or_else(|| format!("expected Modifier{}Key, got '{s}'", keys::SEPARATOR))?;
        let binding = Self::new(modifier.trim(), key.trim());
        if !binding.is_active() {
            return Err(format!("both modifier and key are required, got '{s}'"));
        }
        Ok(binding)
    }
}

pub fn is_known_modifier(modifier: &str) -> bool {
    keys::MODIFIERS.contains(&modifier)
}

pub fn is_known_key(key: &str) -> bool {
    keys::KEYBOARD_KEYS.contains(&key)
}

/// Application actions a shortcut can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionId {
    HideMeter,
    ShowLogs,
    ShowLatestEncounter,
    ResetSession,
    PauseSession,
}

impl ActionId {
    /// Every action, in registration order
    pub const ALL: [ActionId; 5] = [
        ActionId::HideMeter,
        ActionId::ShowLogs,
        ActionId::ShowLatestEncounter,
        ActionId::ResetSession,
        ActionId::PauseSession,
    ];

    /// Name used in the persisted `shortcuts` sub-tree
    pub fn name(self) -> &'static str {
        match self {
            ActionId::HideMeter => "hideMeter",
            ActionId::ShowLogs => "showLogs",
            ActionId::ShowLatestEncounter => "showLatestEncounter",
            ActionId::ResetSession => "resetSession",
            ActionId::PauseSession => "pauseSession",
        }
    }
}

impl FromStr for ActionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionId::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = ActionId::ALL.iter().map(|a| a.name()).collect();
                format!("unknown action '{s}', expected one of: {}", names.join(", "))
            })
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The `shortcuts` sub-tree of the settings: one binding per action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shortcuts {
    pub hide_meter: ShortcutBinding,
    pub show_logs: ShortcutBinding,
    pub show_latest_encounter: ShortcutBinding,
    pub reset_session: ShortcutBinding,
    pub pause_session: ShortcutBinding,
}

impl Shortcuts {
    pub fn binding(&self, action: ActionId) -> &ShortcutBinding {
        match action {
            ActionId::HideMeter => &self.hide_meter,
            ActionId::ShowLogs => &self.show_logs,
            ActionId::ShowLatestEncounter => &self.show_latest_encounter,
            ActionId::ResetSession => &self.reset_session,
            ActionId::PauseSession => &self.pause_session,
        }
    }

    pub fn binding_mut(&mut self, action: ActionId) -> &mut ShortcutBinding {
        match action {
            ActionId::HideMeter => &mut self.hide_meter,
            ActionId::ShowLogs => &mut self.show_logs,
            ActionId::ShowLatestEncounter => &mut self.show_latest_encounter,
            ActionId::ResetSession => &mut self.reset_session,
            ActionId::PauseSession => &mut self.pause_session,
        }
    }

    /// All bindings in registration order
    pub fn iter(&self) -> impl Iterator<Item = (ActionId, &ShortcutBinding)> {
        ActionId::ALL
            .into_iter()
            .map(move |action| (action, self.binding(action)))
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            hide_meter: ShortcutBinding::from_pair(defaults::shortcuts::HIDE_METER),
            show_logs: ShortcutBinding::from_pair(defaults::shortcuts::SHOW_LOGS),
            show_latest_encounter: ShortcutBinding::from_pair(
                defaults::shortcuts::SHOW_LATEST_ENCOUNTER,
            ),
            reset_session: ShortcutBinding::from_pair(defaults::shortcuts::RESET_SESSION),
            pause_session: ShortcutBinding::from_pair(defaults::shortcuts::PAUSE_SESSION),
        }
    }
}
