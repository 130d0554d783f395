//! Environment configuration.
//!
//! Every reader takes a lookup function so the parsing rules can be tested
//! without touching the process environment.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Reads the real process environment.
#[must_use]
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Value of `name`, or `None` when unset or blank.
pub fn optional(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Value of `name`.
///
/// # Errors
///
/// Returns `ConfigError::Missing` when unset or blank.
pub fn required(
    lookup: &dyn Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::Missing(name))
}

/// Parsed value of `name`, or `default` when unset or blank.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` when the value does not parse.
pub fn parse_or<T>(
    lookup: &dyn Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(lookup, name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

/// Comma-separated list in `name`; empty when unset.
pub fn list(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Vec<String> {
    optional(lookup, name)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Where a process listens and how others reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenConfig {
    /// Interface to bind (`HOST`).
    pub host: String,
    /// Port to bind (`PORT`); 0 picks a free one.
    pub port: u16,
    /// Host name registered for discovery (`ADVERTISE_HOST`).
    pub advertise_host: String,
}

impl ListenConfig {
    /// Reads `HOST`, `PORT` and `ADVERTISE_HOST`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `PORT` is not a `u16`.
    pub fn from_lookup(
        lookup: &dyn Fn(&str) -> Option<String>,
        default_port: u16,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            host: optional(lookup, "HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_or(lookup, "PORT", default_port)?,
            advertise_host: optional(lookup, "ADVERTISE_HOST")
                .unwrap_or_else(|| "localhost".to_owned()),
        })
    }

    /// Reads from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ListenConfig::from_lookup`].
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env, default_port)
    }

    /// Loopback listener on a free port, for tests and standalone mode.
    #[must_use]
    pub fn loopback() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 0,
            advertise_host: "127.0.0.1".to_owned(),
        }
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// External backends. `None` selects the in-memory implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// Consul agent (`REGISTRY_URL`, or `CONSUL_URI`).
    pub registry_url: Option<String>,
    /// Kafka bootstrap servers (`KAFKA_URI`).
    pub kafka_uri: Option<String>,
    /// Redis server (`REDIS_URI`).
    pub redis_uri: Option<String>,
    /// PostgreSQL database (`DATABASE_URL`).
    pub database_url: Option<String>,
}

impl BackendConfig {
    /// Reads the backend variables.
    #[must_use]
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            registry_url: optional(lookup, "REGISTRY_URL").or_else(|| optional(lookup, "CONSUL_URI")),
            kafka_uri: optional(lookup, "KAFKA_URI"),
            redis_uri: optional(lookup, "REDIS_URI"),
            database_url: optional(lookup, "DATABASE_URL"),
        }
    }

    /// Reads from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(&process_env)
    }
}

/// Ingester tuning shared by the backend services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSettings {
    /// Pause between drained batches (`INGEST_IDLE_SECS`).
    pub idle_interval: Duration,
    /// Attempts per message before dead-lettering (`INGEST_MAX_ATTEMPTS`).
    pub max_attempts: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_secs(10),
            max_attempts: 3,
        }
    }
}

impl IngestSettings {
    /// Reads `INGEST_IDLE_SECS` and `INGEST_MAX_ATTEMPTS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if either value does not parse or
    /// `INGEST_MAX_ATTEMPTS` is zero.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let idle_secs = parse_or(lookup, "INGEST_IDLE_SECS", defaults.idle_interval.as_secs())?;
        let max_attempts = parse_or(lookup, "INGEST_MAX_ATTEMPTS", defaults.max_attempts)?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "INGEST_MAX_ATTEMPTS",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            idle_interval: Duration::from_secs(idle_secs),
            max_attempts,
        })
    }

    /// Reads from the process environment.
    ///
    /// # Errors
    ///
    /// See [`IngestSettings::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env)
    }
}
