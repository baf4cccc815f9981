//! Window process runtime
//!
//! Owns the settings context, starts the daemon, keeps the global shortcuts in
//! line with the settings and dispatches fired shortcuts. Global shortcuts
//! only fire on Linux/X11; see [`crate::shortcuts::GlobalHotkeyRegistrar`].

use std::path::Path;
use std::process::Child;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::common::color::HexColor;
use crate::config::{ActionId, Settings, ShortcutBinding, Shortcuts};
use crate::context::SettingsContext;
use crate::daemon::{DaemonError, IpcDaemonClient, SettingsSink, WindowControl, spawn_daemon};
use crate::shortcuts::{
    ActionDispatcher, GlobalHotkeyRegistrar, ShortcutManager, spawn_event_bridge,
};
use crate::signals::{Signal, SignalBus};
use crate::store::{DurableBackend, FileBackend};

/// Sink for one-shot commands run while no daemon is attached
struct DetachedSink;

impl SettingsSink for DetachedSink {
    fn persist_configuration(&self, _settings: &serde_json::Value) -> Result<(), DaemonError> {
        debug!("No daemon attached, settings saved to the durable store only");
        Ok(())
    }
}

fn open_backend(data_dir: &Path) -> Result<Arc<dyn DurableBackend>> {
    let backend = FileBackend::open(data_dir)
        .with_context(|| format!("Failed to open settings storage at {:?}", data_dir))?;
    Ok(Arc::new(backend))
}

/// Run the window process until interrupted
pub async fn run_window(data_dir: &Path) -> Result<()> {
    let client = Arc::new(IpcDaemonClient::new());
    let context = SettingsContext::new(
        open_backend(data_dir)?,
        Arc::clone(&client) as Arc<dyn SettingsSink>,
    );

    let (mut daemon, mut bootstrap_rx) = spawn_daemon()?;
    let mut awaiting_daemon = true;

    let bus = SignalBus::new();
    let mut signals = bus.subscribe();
    let dispatcher =
        ActionDispatcher::new(Arc::clone(&client) as Arc<dyn WindowControl>, bus.clone());

    if cfg!(not(target_os = "linux")) {
        warn!("Global shortcuts need a platform event loop on this OS and may never fire");
    }
    let registrar = GlobalHotkeyRegistrar::new().context("Failed to initialize global hotkeys")?;
    let mut shortcuts = ShortcutManager::new(registrar);

    let (hotkey_tx, mut hotkey_rx) = mpsc::unbounded_channel();
    spawn_event_bridge(hotkey_tx);

    // Every settings value (local, external, and the current one right away)
    // is funneled here; only shortcut changes lead to re-registration
    let (shortcut_tx, mut shortcut_rx) = mpsc::unbounded_channel::<Shortcuts>();
    let _settings_subscription = context.settings.subscribe(move |settings: &Settings| {
        let _ = shortcut_tx.send(settings.shortcuts.clone());
    });
    let mut applied: Option<Shortcuts> = None;

    info!(path = %data_dir.display(), "Window process running");
    loop {
        tokio::select! {
            Some(next) = shortcut_rx.recv() => {
                if applied.as_ref() == Some(&next) {
                    continue;
                }
                if let Err(e) = shortcuts.apply(&next) {
                    error!(
                        error = %e,
                        installed = shortcuts.installed_count(),
                        "Shortcuts only partially applied"
                    );
                }
                applied = Some(next);
            }
            Some(id) = hotkey_rx.recv() => {
                match shortcuts.action_for(id) {
                    Some(action) => dispatcher.dispatch(action),
                    None => debug!(id, "Ignoring unknown hotkey"),
                }
            }
            bootstrap = &mut bootstrap_rx, if awaiting_daemon => {
                awaiting_daemon = false;
                match bootstrap {
                    Ok(tx) => {
                        client.connect(tx);
                        sync_daemon(&client, &context.settings.get_snapshot());
                    }
                    Err(_) => warn!("Daemon never connected, settings will only be stored locally"),
                }
            }
            Ok(signal) = signals.recv() => relay_signal(&client, signal),
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    stop_daemon(&mut daemon);
    Ok(())
}

/// Hand the daemon the settings it missed while starting up
fn sync_daemon(client: &IpcDaemonClient, settings: &Settings) {
    let result = serde_json::to_value(settings)
        .map_err(DaemonError::from)
        .and_then(|document| client.persist_configuration(&document));
    if let Err(e) = result {
        error!(error = %e, "Failed to sync settings to daemon");
    }
}

fn relay_signal(client: &IpcDaemonClient, signal: Signal) {
    let result = match signal {
        Signal::ResetRequest => client.reset_session(),
        Signal::PauseRequest => client.pause_session(),
    };
    if let Err(e) = result {
        warn!(signal = %signal, error = %e, "Failed to relay signal to daemon");
    }
}

fn stop_daemon(child: &mut Child) {
    info!(pid = child.id(), "Stopping settings daemon");
    if let Err(e) = child.kill() {
        error!(pid = child.id(), error = %e, "Failed to kill daemon");
    }
    match child.wait() {
        Ok(status) => info!(pid = child.id(), status = ?status, "Daemon exited"),
        Err(e) => error!(pid = child.id(), error = %e, "Failed to wait for daemon exit"),
    }
}

fn detached_context(data_dir: &Path) -> Result<SettingsContext> {
    Ok(SettingsContext::new(
        open_backend(data_dir)?,
        Arc::new(DetachedSink),
    ))
}

/// Print the stored settings as JSON
pub fn show_settings(data_dir: &Path) -> Result<()> {
    let context = detached_context(data_dir)?;
    let json = serde_json::to_string_pretty(&context.settings.get_snapshot())
        .context("Failed to serialize settings")?;
    println!("{json}");
    Ok(())
}

/// Change one shortcut binding; running windows pick it up through the store
pub fn bind_shortcut(data_dir: &Path, action: ActionId, binding: ShortcutBinding) -> Result<()> {
    let context = detached_context(data_dir)?;
    context
        .settings
        .update(|settings| {
            let mut settings = settings.clone();
            *settings.shortcuts.binding_mut(action) = binding.clone();
            settings
        })
        .context("Failed to save settings")?;
    info!(action = %action, binding = %binding, "Updated shortcut");
    Ok(())
}

/// Print or change one class color
pub fn class_color(data_dir: &Path, class: &str, color: Option<&str>) -> Result<()> {
    let context = detached_context(data_dir)?;

    let Some(color) = color else {
        match context.colors.get_snapshot().get(class) {
            Some(color) => println!("{class}: {}", color.to_css()),
            None => bail!("No color stored for class '{class}'"),
        }
        return Ok(());
    };

    let Some(parsed) = HexColor::parse(color) else {
        bail!("'{color}' is not a hex color");
    };
    context
        .colors
        .update(|colors| {
            let mut colors = colors.clone();
            colors.set(class, parsed);
            colors
        })
        .context("Failed to save class colors")?;
    info!(class = %class, color = %parsed.to_css(), "Updated class color");
    Ok(())
}
