//! Durable store for the finalized installation configuration.

use crate::config::InstallationConfig;
use crate::errors::{Error, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Accepts the finalized configuration on successful finish.
pub trait ConfigStore: Send + Sync {
    /// Persists the configuration durably. A failure here leaves the system
    /// uninstalled; the operator may simply retry `finish`.
    fn persist(&self, config: &InstallationConfig) -> Result<()>;
}

/// Writes the configuration as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    /// Creates a store writing to `path`, creating parent directories as
    /// needed at persist time.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for TomlConfigStore {
    fn persist(&self, config: &InstallationConfig) -> Result<()> {
        let body = toml::to_string_pretty(config).map_err(|e| Error::Config {
            message: format!("failed to serialize installation config: {e}"),
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, body)?;

        info!(path = %self.path.display(), "persisted installation config");
        Ok(())
    }
}
