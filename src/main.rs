#![deny(unsafe_code)]

mod app;
mod common;
mod config;
mod context;
mod daemon;
mod shortcuts;
mod signals;
mod store;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::Level as TraceLevel;
use tracing_subscriber::FmtSubscriber;

use crate::config::{ActionId, ShortcutBinding};
use crate::store::FileBackend;

#[derive(Parser)]
#[command(name = "meter-settings")]
#[command(version)]
#[command(about = "Persisted meter settings with global shortcuts", long_about = None)]
struct Cli {
    /// Run in daemon mode (background process owning the settings file)
    #[arg(long)]
    daemon: bool,

    /// Name of the IPC server to connect to in daemon mode
    #[arg(long)]
    ipc_server: Option<String>,

    /// Directory holding the per-domain settings documents
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the stored settings
    Show,
    /// Bind a shortcut, e.g. `bind hideMeter Ctrl+F1`
    Bind {
        action: ActionId,
        binding: ShortcutBinding,
    },
    /// Remove a shortcut binding
    Unbind { action: ActionId },
    /// Print a class color, or change it when COLOR is given
    Color { class: String, color: Option<String> },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.debug {
        TraceLevel::DEBUG
    } else {
        TraceLevel::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = cli.data_dir.unwrap_or_else(FileBackend::default_dir);

    match cli.command {
        Some(Command::Show) => return app::show_settings(&data_dir),
        Some(Command::Bind { action, binding }) => {
            return app::bind_shortcut(&data_dir, action, binding);
        }
        Some(Command::Unbind { action }) => {
            return app::bind_shortcut(&data_dir, action, ShortcutBinding::unbound());
        }
        Some(Command::Color { class, color }) => {
            return app::class_color(&data_dir, &class, color.as_deref());
        }
        None => {}
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if cli.daemon {
        // Privileged process: persists settings and owns window/session state
        let Some(server_name) = cli.ipc_server else {
            bail!("--ipc-server is required in daemon mode");
        };
        rt.block_on(daemon::run_daemon(server_name))
    } else {
        // Default mode: the window process, which manages the daemon lifecycle
        rt.block_on(app::run_window(&data_dir))
    }
}
