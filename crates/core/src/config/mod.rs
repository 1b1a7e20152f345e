//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if CVETRACK_CONFIG_FILE set)
//! 3. Environment variables (CVETRACK_*)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration shared by the server and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database holding the authoritative records table.
    ///
    /// Set via CVETRACK_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// SQLite database holding the client's local cache.
    ///
    /// Set via CVETRACK_CACHE_PATH environment variable.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Base URL of the registry HTTP API.
    ///
    /// Set via CVETRACK_API_URL environment variable.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Address the HTTP server listens on.
    ///
    /// Set via CVETRACK_BIND environment variable.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Bound on a single remote store call, in milliseconds.
    ///
    /// Set via CVETRACK_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cvetrack.sqlite")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./cvetrack-cache.sqlite")
}

fn default_api_url() -> String {
    "http://127.0.0.1:3000".into()
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_path: default_cache_path(),
            api_url: default_api_url(),
            bind: default_bind(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered figment `load` extracts from. Callers may merge further
    /// providers (e.g. command-line overrides) before extracting.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CVETRACK_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("CVETRACK_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Extract and validate a configuration from a figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
