mod backup;
mod config;
mod engine;
mod input;
mod models;
mod run;
mod store;
mod ui;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use config::{Backend, Settings};
use store::{LocalStore, RecordStore, RemoteStore, Session};

fn main() -> Result<()> {
    let cli = run::Cli::parse();
    let settings = Settings::load(&cli.global)?;
    let data_dir = settings.resolve_data_dir()?;
    init_logging(&data_dir, settings.log_level())?;

    match cli.command {
        Some(command) if command.is_account() => run::as_account(
            command,
            &settings.remote,
            &config::session_path(&data_dir),
        ),
        command => {
            let store = open_store(&settings, &data_dir)?;
            tracing::info!(backend = store.name(), "store opened");
            match command {
                None => run::as_tui(store.as_ref()),
                Some(command) => run::as_cli(command, store.as_ref()),
            }
        }
    }
}

/// Logs go to a file in the data directory so they never draw over the TUI.
/// `RUST_LOG` overrides the configured level.
fn init_logging(data_dir: &Path, level: &str) -> Result<()> {
    let path = config::log_path(data_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fintrack={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn open_store(settings: &Settings, data_dir: &Path) -> Result<Box<dyn RecordStore>> {
    let store: Box<dyn RecordStore> = match settings.backend {
        Backend::Local => {
            let path = config::database_path(data_dir);
            Box::new(
                LocalStore::open(&path)
                    .with_context(|| format!("Failed to open database: {}", path.display()))?,
            )
        }
        Backend::Remote => Box::new(open_remote(settings, data_dir)?),
    };
    Ok(store)
}

/// A configured access token wins; otherwise the session saved by
/// `fintrack login` is used.
fn open_remote(settings: &Settings, data_dir: &Path) -> Result<RemoteStore> {
    if !settings.remote.access_token.is_empty() {
        return RemoteStore::new(&settings.remote).context("Failed to configure remote backend");
    }
    let path = config::session_path(data_dir);
    let Some(session) = Session::load(&path).context("Failed to read saved session")? else {
        bail!("Not signed in to the remote backend. Run `fintrack login <email>` first");
    };
    RemoteStore::signed_in(
        &settings.remote,
        session,
        path,
        chrono::Utc::now().timestamp(),
    )
    .context("Failed to configure remote backend")
}
