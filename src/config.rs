//! Persistent application settings.
//!
//! Settings live in a TOML file next to the application; a missing file
//! yields the defaults. Which settings apply depends on the mode an
//! embedding application runs in, so configuration UIs can show only the
//! relevant ones.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};

/// Operating modes of an application embedding the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Local database, no networking.
    Standalone,
    /// Connects to a remote server.
    NetworkClient,
    /// Serves a local database to remote clients.
    Server,
}

/// The configurable settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    DatabasePath,
    ServerHost,
    ServerPort,
}

impl Setting {
    /// Whether this setting is relevant for a given mode.
    pub fn applies_to(self, mode: Mode) -> bool {
        match self {
            Setting::DatabasePath => matches!(mode, Mode::Standalone | Mode::Server),
            Setting::ServerHost => mode == Mode::NetworkClient,
            Setting::ServerPort => mode == Mode::Server,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Location of the database file.
    pub database_path: PathBuf,
    /// Hostname of the server to connect to.
    pub server_host: String,
    /// Port the server listens on.
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from("database.db"),
            server_host: "localhost".into(),
            server_port: 1099,
        }
    }
}

impl Config {
    /// Loads settings from a TOML file, falling back to the defaults when
    /// the file doesn't exist yet.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text)
                .map_err(|e| DbError::InvalidArgument(format!("malformed configuration: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the settings back. Failures surface as
    /// [`DbError::ConfigSave`] so callers aren't coupled to the storage
    /// medium.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| DbError::ConfigSave(e.to_string()))?;
        fs::write(&path, text).map_err(|e| DbError::ConfigSave(e.to_string()))?;

        tracing::info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
