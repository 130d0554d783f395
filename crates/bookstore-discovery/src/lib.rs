//! Service registry client.
//!
//! Processes register one [`ServiceInstance`] at startup, keep it healthy
//! with a periodic heartbeat and deregister on shutdown. Callers resolve a
//! service name to the addresses of its healthy instances.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub mod consul;
pub mod memory;
pub mod registration;

pub use consul::ConsulRegistry;
pub use memory::InMemoryRegistry;
pub use registration::Registration;

/// Errors raised by registry backends.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An address was not of the form `host:port`.
    #[error("invalid address {0:?}: expected host:port")]
    InvalidAddress(String),

    /// The instance is not known to the registry.
    #[error("instance {0} is not registered")]
    NotRegistered(String),

    /// The registry could not be reached or rejected the request.
    #[error("registry backend error: {0}")]
    Backend(String),
}

/// A validated `host:port` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPort {
    host: String,
    port: u16,
}

impl HostPort {
    /// Parses `host:port`. The host must be non-empty and the port numeric.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidAddress` otherwise.
    pub fn parse(value: &str) -> Result<Self, RegistryError> {
        let invalid = || RegistryError::InvalidAddress(value.to_owned());
        let (host, port) = value.rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }

    /// Host part.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port part.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One running process of a named service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    /// Unique per process, see [`generate_instance_id`].
    pub instance_id: String,
    /// Logical service name used for discovery.
    pub service_name: String,
    /// Address other processes dial.
    pub address: HostPort,
}

impl ServiceInstance {
    /// Builds an instance, validating `host_port`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidAddress` if `host_port` is not
    /// `host:port`.
    pub fn new(
        instance_id: impl Into<String>,
        service_name: impl Into<String>,
        host_port: &str,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            instance_id: instance_id.into(),
            service_name: service_name.into(),
            address: HostPort::parse(host_port)?,
        })
    }
}

/// Instance id of the form `<service>-<random u64>`.
#[must_use]
pub fn generate_instance_id(service_name: &str) -> String {
    format!("{service_name}-{}", rand::random::<u64>())
}

/// Registry backend.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Registers `instance` as healthy.
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError>;

    /// Removes the instance.
    async fn deregister(&self, instance_id: &str) -> Result<(), RegistryError>;

    /// Reports the instance as alive, extending its health TTL.
    async fn health_check(&self, instance_id: &str) -> Result<(), RegistryError>;

    /// Addresses (`host:port`) of every healthy instance of `service_name`.
    /// An empty list means none are healthy; it is not an error.
    async fn discover(&self, service_name: &str) -> Result<Vec<String>, RegistryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_port_parses_valid_address() {
        let address = HostPort::parse("books.internal:8081").unwrap();

        assert_eq!(address.host(), "books.internal");
        assert_eq!(address.port(), 8081);
        assert_eq!(address.to_string(), "books.internal:8081");
    }

    #[test]
    fn test_host_port_rejects_malformed_addresses() {
        for value in ["localhost", ":8080", "localhost:http", "localhost:70000", ""] {
            assert!(
                matches!(HostPort::parse(value), Err(RegistryError::InvalidAddress(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_service_instance_new_validates_address() {
        assert!(ServiceInstance::new("books-1", "books", "localhost:8081").is_ok());
        assert!(ServiceInstance::new("books-1", "books", "localhost").is_err());
    }

    #[test]
    fn test_generate_instance_id_is_prefixed_with_service_name() {
        let first = generate_instance_id("auth");
        let second = generate_instance_id("auth");

        assert!(first.starts_with("auth-"));
        assert!(first["auth-".len()..].parse::<u64>().is_ok());
        assert_ne!(first, second);
    }
}
