//! Session timing configuration.
//!
//! ```
//! use habitat_session::config::{validate_config, SessionConfig};
//!
//! let config = SessionConfig::from_json(r#"{ "debounce_ms": 250 }"#).unwrap();
//! assert_eq!(config.evaluation_timeout_ms, 10_000);
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Longest accepted debounce before a re-evaluation starts.
pub const MAX_DEBOUNCE_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Quiet period after an occupancy change before scoring starts.
    pub debounce_ms: u64,
    /// Upper bound on a single evaluation, applied at the evaluator boundary.
    pub evaluation_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            evaluation_timeout_ms: 10_000,
        }
    }
}

impl SessionConfig {
    /// No debounce, default timeout. Useful for headless runs.
    pub fn immediate() -> Self {
        Self {
            debounce_ms: 0,
            ..Self::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_millis(self.evaluation_timeout_ms)
    }

    /// Parse and validate. Missing fields take their defaults; the input must
    /// be a JSON object with no unknown keys.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(LoadError::NotAnObject);
        }
        let config: SessionConfig = serde_json::from_value(value)?;
        let errors = validate_config(&config);
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(LoadError::Invalid(errors))
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("debounce of {0} ms exceeds the {max} ms limit", max = MAX_DEBOUNCE_MS)]
    DebounceTooLong(u64),
    #[error("evaluation timeout must be positive")]
    ZeroTimeout,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("session config is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("session config must be a JSON object")]
    NotAnObject,
    #[error("session config is invalid: {0:?}")]
    Invalid(Vec<ConfigError>),
}

/// Validate a session configuration, returning all errors found.
pub fn validate_config(config: &SessionConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    if config.debounce_ms > MAX_DEBOUNCE_MS {
        errors.push(ConfigError::DebounceTooLong(config.debounce_ms));
    }
    if config.evaluation_timeout_ms == 0 {
        errors.push(ConfigError::ZeroTimeout);
    }
    errors
}
