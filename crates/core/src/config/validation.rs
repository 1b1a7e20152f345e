//! Post-load checks on `AppConfig`.

use std::ops::RangeInclusive;
use std::path::Path;

use thiserror::Error;
use url::Url;

use crate::config::AppConfig;

/// Accepted remote call bound, in milliseconds.
const TIMEOUT_MS: RangeInclusive<u64> = 100..=300_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { field: field.to_string(), reason: reason.into() }
    }
}

fn require_path(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Missing {
            field: field.to_string(),
            hint: format!("set CVETRACK_{}", field.to_ascii_uppercase()),
        });
    }
    Ok(())
}

/// An absolute http(s) URL with a host.
fn check_api_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::invalid("api_url", format!("{raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::invalid("api_url", format!("{raw:?} is not an http(s) URL")));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::invalid("api_url", format!("{raw:?} has no host")));
    }
    Ok(())
}

impl AppConfig {
    /// Check loaded values.
    ///
    /// # Errors
    ///
    /// `Invalid` for a `timeout_ms` outside 100ms..=5min or a non-http(s)
    /// `api_url`; `Missing` for an empty `db_path` or `cache_path`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TIMEOUT_MS.contains(&self.timeout_ms) {
            return Err(ConfigError::invalid(
                "timeout_ms",
                format!("{} is outside {}..={} ms", self.timeout_ms, TIMEOUT_MS.start(), TIMEOUT_MS.end()),
            ));
        }

        check_api_url(&self.api_url)?;

        require_path("db_path", &self.db_path)?;
        require_path("cache_path", &self.cache_path)?;

        // Allowed: the two tables never collide, but it is rarely intended.
        if self.db_path == self.cache_path {
            tracing::warn!(path = %self.db_path.display(), "db_path and cache_path share one database file");
        }

        Ok(())
    }
}
