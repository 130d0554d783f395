//! Startup and runtime errors.

use thiserror::Error;

use bookstore_bus::BusError;
use bookstore_cache::CacheError;
use bookstore_discovery::RegistryError;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Anything that can stop a process from starting or serving.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A required environment variable is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or span export could not be set up.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The service registry rejected or could not take the registration.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The event log could not be reached.
    #[error("event bus error: {0}")]
    Bus(#[from] BusError),

    /// The cache could not be reached.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// A backend was configured that this build does not include.
    #[error("{0} support is not compiled in; rebuild with the `{0}` feature")]
    FeatureDisabled(&'static str),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}
