//! Gateway settings read from the environment.

use std::time::Duration;

use bookstore_cache::DEFAULT_TTL;
use bookstore_rpc::client::DEFAULT_TIMEOUT;
use bookstore_runtime::config::{ConfigError, parse_or, process_env, required};

/// Token signing, cache and RPC settings of the gateway.
#[derive(Clone)]
pub struct ApiSettings {
    /// HMAC secret for issued tokens (`JWT_SECRET`).
    pub jwt_secret: String,
    /// Token lifetime (`JWT_TTL_HOURS`).
    pub jwt_ttl: Duration,
    /// Lifetime of cached reads (`CACHE_TTL_SECS`).
    pub cache_ttl: Duration,
    /// Per-call RPC timeout (`RPC_TIMEOUT_MS`).
    pub rpc_timeout: Duration,
}

impl ApiSettings {
    /// Default token lifetime.
    pub const DEFAULT_JWT_TTL: Duration = Duration::from_secs(72 * 60 * 60);

    /// Settings with `jwt_secret` and defaults for everything else.
    #[must_use]
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_ttl: Self::DEFAULT_JWT_TTL,
            cache_ttl: DEFAULT_TTL,
            rpc_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `JWT_SECRET`, `JWT_TTL_HOURS`, `CACHE_TTL_SECS` and
    /// `RPC_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` without a secret and
    /// `ConfigError::Invalid` if a number does not parse.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::with_secret(required(lookup, "JWT_SECRET")?);
        let ttl_hours = parse_or(lookup, "JWT_TTL_HOURS", defaults.jwt_ttl.as_secs() / 3600)?;
        let cache_secs = parse_or(lookup, "CACHE_TTL_SECS", defaults.cache_ttl.as_secs())?;
        let rpc_millis = parse_or(lookup, "RPC_TIMEOUT_MS", 5000_u64)?;
        Ok(Self {
            jwt_ttl: Duration::from_secs(ttl_hours * 3600),
            cache_ttl: Duration::from_secs(cache_secs),
            rpc_timeout: Duration::from_millis(rpc_millis),
            ..defaults
        })
    }

    /// Reads from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ApiSettings::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env)
    }
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("cache_ttl", &self.cache_ttl)
            .field("rpc_timeout", &self.rpc_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_secret_is_required() {
        let result = ApiSettings::from_lookup(&env(&[("JWT_TTL_HOURS", "1")]));

        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn test_defaults() {
        let settings = ApiSettings::from_lookup(&env(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(settings.jwt_ttl, Duration::from_secs(72 * 3600));
        assert_eq!(settings.cache_ttl, Duration::from_secs(600));
        assert_eq!(settings.rpc_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides_and_redacted_debug() {
        let settings = ApiSettings::from_lookup(&env(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_HOURS", "2"),
            ("CACHE_TTL_SECS", "30"),
            ("RPC_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(settings.jwt_ttl, Duration::from_secs(7200));
        assert_eq!(settings.cache_ttl, Duration::from_secs(30));
        assert_eq!(settings.rpc_timeout, Duration::from_millis(250));
        assert!(!format!("{settings:?}").contains("s3cret"));
    }

    #[test]
    fn test_rejects_non_numeric_ttl() {
        let result = ApiSettings::from_lookup(&env(&[
            ("JWT_SECRET", "s3cret"),
            ("CACHE_TTL_SECS", "ten"),
        ]));

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "CACHE_TTL_SECS",
                ..
            })
        ));
    }
}
