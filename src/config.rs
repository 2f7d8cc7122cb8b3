use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "fintrack.toml";
const ENV_PREFIX: &str = "FINTRACK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Backend {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct RemoteSettings {
    /// Project URL, e.g. `https://abc123.supabase.co`.
    pub(crate) url: String,
    pub(crate) api_key: String,
    /// Access token of the signed-in user.
    pub(crate) access_token: String,
    /// Owner id injected into every write.
    pub(crate) user_id: String,
    pub(crate) timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            access_token: String::new(),
            user_id: String::new(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) backend: Backend,
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) log_level: Option<String>,
    pub(crate) remote: RemoteSettings,
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct GlobalArgs {
    /// Config file (TOML). Defaults to fintrack.toml in the user config dir.
    #[arg(long, global = true, env = "FINTRACK_CONFIG")]
    pub(crate) config: Option<PathBuf>,
    /// Storage backend to use.
    #[arg(long, global = true, value_enum)]
    pub(crate) backend: Option<Backend>,
    /// Directory for the local database and log file.
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,
}

impl Settings {
    /// Layer the config file, `FINTRACK_*` environment variables and
    /// command-line flags, later sources winning.
    pub(crate) fn load(args: &GlobalArgs) -> Result<Self> {
        let path = args.config.clone().or_else(default_config_path);

        let mut builder = config::Config::builder();
        if let Some(path) = &path {
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let mut settings: Settings = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.apply_overrides(args);
        Ok(settings)
    }

    fn apply_overrides(&mut self, args: &GlobalArgs) {
        if let Some(backend) = args.backend {
            self.backend = backend;
        }
        if let Some(dir) = &args.data_dir {
            self.data_dir = Some(dir.clone());
        }
    }

    pub(crate) fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Data directory, created if missing.
    pub(crate) fn resolve_data_dir(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        Ok(dir)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "fintrack", "fintrack")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join(CONFIG_FILE))
}

fn default_data_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
}

pub(crate) fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("fintrack.db")
}

pub(crate) fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("fintrack.log")
}

/// Saved sign-in for the remote backend, written by `fintrack login`.
pub(crate) fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join("session.json")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
