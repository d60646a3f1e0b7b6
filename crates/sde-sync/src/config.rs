//! Engine configuration
//!
//! Loaded from TOML, overridden by `SDE_BASE_URL` / `SDE_CLIENT_ID`, then
//! validated before the engine is built.

use crate::feedback::Severity;
use sde_catalog::ClientId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`EngineConfig::base_url`]
pub const ENV_BASE_URL: &str = "SDE_BASE_URL";
/// Environment variable overriding [`EngineConfig::client_id`]
pub const ENV_CLIENT_ID: &str = "SDE_CLIENT_ID";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config value: {0}")]
    Invalid(String),

    /// Hint store could not be opened
    #[error("hint store error: {0}")]
    Store(#[from] sde_selection::StoreError),
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend root URL
    pub base_url: String,
    /// Client whose selections are managed
    pub client_id: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Industry-switch debounce in milliseconds
    pub debounce_ms: u64,
    /// Notice durations
    pub feedback: FeedbackConfig,
    /// Warm-start hint file; hints are disabled when unset
    pub hints_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML for this schema
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// With client id
    #[inline]
    #[must_use]
    pub fn with_client_id(mut self, client: impl Into<String>) -> Self {
        self.client_id = client.into();
        self
    }

    /// With debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With hint file
    #[inline]
    #[must_use]
    pub fn with_hints_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.hints_path = Some(path.into());
        self
    }

    /// Apply `SDE_BASE_URL` and `SDE_CLIENT_ID` from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(client) = lookup(ENV_CLIENT_ID).filter(|v| !v.trim().is_empty()) {
            self.client_id = client;
        }
        self
    }

    /// Validated client id
    ///
    /// # Errors
    /// Returns error if the client id is blank
    pub fn client(&self) -> Result<ClientId, ConfigError> {
        ClientId::new(&self.client_id).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check all values
    ///
    /// # Errors
    /// Returns the first invalid value found
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client()?;
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Debounce window
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            client_id: String::new(),
            request_timeout_secs: 30,
            debounce_ms: 300,
            feedback: FeedbackConfig::default(),
            hints_path: None,
        }
    }
}

/// Notice durations in milliseconds, per severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Toggle confirmations
    pub routine_ms: u64,
    /// Completed writes
    pub success_ms: u64,
    /// Degraded results
    pub warning_ms: u64,
    /// Failures
    pub error_ms: u64,
    /// Constraint violations
    pub constraint_ms: u64,
}

impl FeedbackConfig {
    /// Duration for `severity`
    #[must_use]
    pub fn duration(&self, severity: Severity) -> Duration {
        let ms = match severity {
            Severity::Routine => self.routine_ms,
            Severity::Success => self.success_ms,
            Severity::Warning => self.warning_ms,
            Severity::Error => self.error_ms,
            Severity::Constraint => self.constraint_ms,
        };
        Duration::from_millis(ms)
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            routine_ms: 2000,
            success_ms: 3000,
            warning_ms: 5000,
            error_ms: 5000,
            constraint_ms: 7000,
        }
    }
}
