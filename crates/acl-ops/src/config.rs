//! Operation defaults.
//!
//! Options left unset on a request fall back to these values. They are
//! loaded from environment variables with conservative defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Defaults for permission operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpsConfig {
    /// Report intended changes from Grant and Revoke without writing them.
    pub dry_run: bool,

    /// Make Get and Test look at inherited entries.
    pub include_inherited: bool,

    /// Make Test require exact rights equality.
    pub strict_tests: bool,
}

impl OpsConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ACL_DRY_RUN`: Report changes without writing (default: false)
    /// - `ACL_INCLUDE_INHERITED`: Consider inherited entries (default: false)
    /// - `ACL_STRICT_TESTS`: Exact rights equality in Test (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let flag = |key: &str, fallback: bool| match lookup(key) {
            Some(value) => parse_bool(key, &value),
            None => Ok(fallback),
        };

        Ok(Self {
            dry_run: flag("ACL_DRY_RUN", default.dry_run)?,
            include_inherited: flag("ACL_INCLUDE_INHERITED", default.include_inherited)?,
            strict_tests: flag("ACL_STRICT_TESTS", default.strict_tests)?,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}
