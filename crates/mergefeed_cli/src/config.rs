//! Configuration file support.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `MERGEFEED_`)
//! 3. Config file (~/.config/mergefeed/config.toml or ./mergefeed.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/mergefeed/mergefeed.db?mode=rwc"
//!
//! [member]
//! id = "00000000-0000-0000-0000-000000000000"  # printed by `mergefeed login`
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use uuid::Uuid;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Default member identity.
    pub member: MemberConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL. Supports sqlite:// and postgres:// schemes.
    /// Defaults to a sqlite database in the XDG state directory.
    pub url: Option<String>,
}

/// Default member identity used when commands omit `--member`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MemberConfig {
    /// Member id as printed by `mergefeed login`.
    pub id: Option<Uuid>,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file_path() {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(File::new("mergefeed", FileFormat::Toml).required(false));
        builder = builder.add_source(Environment::with_prefix("MERGEFEED").separator("_"));

        builder.build()?.try_deserialize()
    }

    /// The effective database URL, creating the state directory for the
    /// default sqlite location when needed.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database.url {
            return url.clone();
        }
        default_database_url()
    }
}

fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mergefeed").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn default_database_url() -> String {
    let dir = ProjectDirs::from("", "", "mergefeed")
        .map(|dirs| {
            dirs.state_dir()
                .unwrap_or_else(|| dirs.data_dir())
                .to_path_buf()
        })
        .unwrap_or_else(|| PathBuf::from("."));

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %e, dir = %dir.display(), "could not create state directory");
    }

    format!("sqlite://{}?mode=rwc", dir.join("mergefeed.db").display())
}
