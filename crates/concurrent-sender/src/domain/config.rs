//! Sender configuration with validation.
//!
//! Defaults applied to every request a sender builds, loadable from TOML:
//!
//! ```toml
//! owner_name = "main-session"
//! default_route = 2
//! default_wait_budget = "0ms"
//! max_wait_budget = "1m"
//! default_fail_skip = "handle_flood"
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{FailSkipPolicy, RoutingKey};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Sender-wide request defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Name of the owner context, used in logs.
    pub owner_name: String,
    /// Route used when a builder does not call `to_route`.
    pub default_route: RoutingKey,
    /// Wait budget used when a builder does not call `with_wait_budget`.
    #[serde(with = "humantime_serde")]
    pub default_wait_budget: Duration,
    /// Upper bound for any wait budget; larger values are clamped.
    #[serde(with = "humantime_serde")]
    pub max_wait_budget: Duration,
    /// Policy used when a builder does not pick one.
    pub default_fail_skip: FailSkipPolicy,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            owner_name: "sender".to_string(),
            default_route: RoutingKey::MAIN,
            default_wait_budget: Duration::ZERO,
            max_wait_budget: Duration::from_secs(60),
            default_fail_skip: FailSkipPolicy::Simple,
        }
    }
}

impl SenderConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner_name.trim().is_empty() {
            return Err(ConfigError::Invalid("owner_name cannot be empty".into()));
        }

        if self.default_wait_budget > self.max_wait_budget {
            return Err(ConfigError::InvalidWaitBudget {
                default: self.default_wait_budget,
                max: self.max_wait_budget,
            });
        }

        Ok(())
    }

    /// Clamp a requested wait budget to `max_wait_budget`.
    pub fn clamp_wait_budget(&self, budget: Duration) -> Duration {
        budget.min(self.max_wait_budget)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("default wait budget {default:?} exceeds max {max:?}")]
    InvalidWaitBudget { default: Duration, max: Duration },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Human-readable `Duration` (de)serialization: `"250ms"`, `"5s"`, `"2m"`.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 && !duration.is_zero() {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" must be checked before "s" and "m".
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
