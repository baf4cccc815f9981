//! Daemon-side state and request handling

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::common::constants::{config, resources};
use crate::common::ipc::DaemonRequest;
use crate::config::{GeneralSettings, Settings};
use crate::store::StoreValue;

/// Packet capture parameters derived from the general settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Interface to bind, `None` to pick one automatically
    pub interface: Option<String>,
    pub ip: String,
    pub port: u16,
    pub raw_socket: bool,
}

impl CaptureConfig {
    pub fn from_settings(general: &GeneralSettings) -> Self {
        let interface = (!general.auto_iface && !general.if_desc.is_empty())
            .then(|| general.if_desc.clone());
        Self {
            interface,
            ip: general.ip.clone(),
            port: general.port,
            raw_socket: general.raw_socket,
        }
    }
}

pub struct DaemonState {
    settings_path: PathBuf,
    pub capture: CaptureConfig,
    pub meter_visible: bool,
    pub paused: bool,
    pub resets: u32,
    pub last_reset: Option<DateTime<Local>>,
    pub last_navigation: Option<String>,
    pub encounter_opens: u32,
}

impl DaemonState {
    /// Default location of the settings file
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Build state from the settings file at `settings_path`, if any
    pub fn load(settings_path: impl Into<PathBuf>) -> Self {
        let settings_path = settings_path.into();
        let settings = read_settings(&settings_path);
        let capture = CaptureConfig::from_settings(&settings.general);
        info!(
            path = %settings_path.display(),
            port = capture.port,
            interface = ?capture.interface,
            raw_socket = capture.raw_socket,
            "Daemon state initialized"
        );

        Self {
            settings_path,
            capture,
            meter_visible: true,
            paused: false,
            resets: 0,
            last_reset: None,
            last_navigation: None,
            encounter_opens: 0,
        }
    }

    #[cfg(test)]
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn handle(&mut self, request: DaemonRequest) -> Result<()> {
        match request {
            DaemonRequest::PersistSettings(json) => self.persist_settings(&json)?,
            DaemonRequest::ToggleMeterWindow => {
                self.meter_visible = !self.meter_visible;
                info!(visible = self.meter_visible, "Toggled meter window");
            }
            DaemonRequest::Navigate(resource) => {
                if resource != resources::LOGS {
                    warn!(resource = %resource, "Navigating to unknown resource");
                }
                info!(resource = %resource, "Opening resource");
                self.last_navigation = Some(resource);
            }
            DaemonRequest::OpenMostRecentEncounter => {
                self.encounter_opens += 1;
                info!("Opening most recent encounter");
            }
            DaemonRequest::ResetSession => {
                let now = Local::now();
                self.resets += 1;
                self.last_reset = Some(now);
                info!(at = %now.format("%H:%M:%S"), "Soft reset of current encounter");
            }
            DaemonRequest::PauseSession => {
                self.paused = !self.paused;
                info!(paused = self.paused, "Toggled encounter tracking");
            }
        }
        Ok(())
    }

    fn persist_settings(&mut self, json: &str) -> Result<()> {
        let document: serde_json::Value =
            serde_json::from_str(json).context("Received malformed settings document")?;

        let settings = Settings::restore(document.clone(), &Settings::default());
        let capture = CaptureConfig::from_settings(&settings.general);
        if capture != self.capture {
            warn!(
                port = capture.port,
                interface = ?capture.interface,
                "Capture settings changed, restart the meter to apply them"
            );
            self.capture = capture;
        }

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let pretty =
            serde_json::to_string_pretty(&document).context("Failed to serialize settings")?;
        let mut file = AtomicWriteFile::options()
            .open(&self.settings_path)
            .with_context(|| format!("Failed to open {:?}", self.settings_path))?;
        file.write_all(pretty.as_bytes())
            .with_context(|| format!("Failed to write {:?}", self.settings_path))?;
        file.commit()
            .with_context(|| format!("Failed to commit {:?}", self.settings_path))?;

        debug!(path = %self.settings_path.display(), "Persisted settings");
        Ok(())
    }
}

/// Read the settings file, falling back to defaults when missing or unreadable
fn read_settings(path: &Path) -> Settings {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No settings file yet, using defaults");
            return Settings::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read settings file, using defaults");
            return Settings::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(document) => Settings::restore(document, &Settings::default()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Settings file is not valid JSON, using defaults");
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::defaults;

    fn state_in(dir: &tempfile::TempDir) -> DaemonState {
        DaemonState::load(dir.path().join("meter-settings").join("settings.json"))
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);

        assert_eq!(state.capture.port, defaults::general::PORT);
        assert_eq!(state.capture.interface, None);
        assert!(state.meter_visible);
        assert!(!state.paused);
    }

    #[test]
    fn test_persist_writes_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);

        let mut settings = Settings::default();
        settings.meter.dps = false;
        let json = serde_json::to_string(&settings).unwrap();
        state
            .handle(DaemonRequest::PersistSettings(json))
            .unwrap();

        let written = fs::read_to_string(state.settings_path()).unwrap();
        let reloaded: Settings = serde_json::from_str(&written).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_persist_rejects_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);

        let result = state.handle(DaemonRequest::PersistSettings("{oops".to_string()));
        assert!(result.is_err());
        assert!(!state.settings_path().exists());
    }

    #[test]
    fn test_persist_tracks_capture_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);

        let mut settings = Settings::default();
        settings.general.port = 6041;
        settings.general.auto_iface = false;
        settings.general.if_desc = "eth0".to_string();
        state
            .handle(DaemonRequest::PersistSettings(
                serde_json::to_string(&settings).unwrap(),
            ))
            .unwrap();

        assert_eq!(state.capture.port, 6041);
        assert_eq!(state.capture.interface.as_deref(), Some("eth0"));

        // A fresh daemon picks the persisted capture settings up
        let restarted = state_in(&dir);
        assert_eq!(restarted.capture, state.capture);
    }

    #[test]
    fn test_window_and_session_requests() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);

        state.handle(DaemonRequest::ToggleMeterWindow).unwrap();
        assert!(!state.meter_visible);
        state.handle(DaemonRequest::ToggleMeterWindow).unwrap();
        assert!(state.meter_visible);

        state
            .handle(DaemonRequest::Navigate(resources::LOGS.to_string()))
            .unwrap();
        assert_eq!(state.last_navigation.as_deref(), Some("logs"));

        state.handle(DaemonRequest::OpenMostRecentEncounter).unwrap();
        assert_eq!(state.encounter_opens, 1);

        state.handle(DaemonRequest::ResetSession).unwrap();
        assert_eq!(state.resets, 1);
        assert!(state.last_reset.is_some());

        state.handle(DaemonRequest::PauseSession).unwrap();
        assert!(state.paused);
        state.handle(DaemonRequest::PauseSession).unwrap();
        assert!(!state.paused);
    }
}
