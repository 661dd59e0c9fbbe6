//! Console configuration.
//!
//! Values are layered, later layers winning:
//!
//! 1. Built-in defaults (`127.0.0.1:15021`, 5 s, single read)
//! 2. TOML file (`--config <path>` or `<config_dir>/amas-console/config.toml`)
//! 3. `AMAS_CONSOLE_*` environment variables
//! 4. Command-line flags (applied by the binary)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::wire::{
    ExchangeOptions, ReadStrategy, Target, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS,
};

/// Default number of exchanges kept in the History tab.
const DEFAULT_HISTORY_LIMIT: usize = 100;

const ENV_HOST: &str = "AMAS_CONSOLE_HOST";
const ENV_PORT: &str = "AMAS_CONSOLE_PORT";
const ENV_TIMEOUT: &str = "AMAS_CONSOLE_TIMEOUT";
const ENV_READ: &str = "AMAS_CONSOLE_READ";
const ENV_LOG_DIR: &str = "AMAS_CONSOLE_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub read_strategy: ReadStrategy,
    pub history_limit: usize,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            read_strategy: ReadStrategy::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            log_dir: default_log_dir(),
        }
    }
}

/// Resolve the default config file path.
///
/// `$XDG_CONFIG_HOME/amas-console/config.toml` on Linux,
/// `~/Library/Application Support/amas-console/config.toml` on macOS.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("amas-console").join("config.toml"))
}

/// Resolve the default log directory.
///
/// Falls back to `./logs` when the platform has no local data directory.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("amas-console").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(default) if default.is_file() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no exchange can work with.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("Invalid timeout_secs value: 0 (must be at least 1 second)");
        }
        Ok(())
    }

    /// Override fields from environment variables.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} value: {}", ENV_PORT, port))?;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            self.timeout_secs = timeout
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| format!("Invalid {} value: {}", ENV_TIMEOUT, timeout))?;
        }
        if let Some(read) = lookup(ENV_READ) {
            self.read_strategy = read.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn target(&self) -> Target {
        Target::new(self.host.clone(), self.port)
    }

    pub fn exchange_options(&self) -> ExchangeOptions {
        ExchangeOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            read_strategy: self.read_strategy,
        }
    }
}
