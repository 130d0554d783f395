//! A registered HTTP node: listener, registry entry and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use bookstore_discovery::registration::{DEREGISTER_TIMEOUT, HEARTBEAT_INTERVAL};
use bookstore_discovery::{Registration, Registry, ServiceInstance, generate_instance_id};

use crate::config::ListenConfig;
use crate::error::RuntimeError;

/// A bound listener whose address is registered under a service name.
pub struct Node {
    listener: TcpListener,
    local_addr: SocketAddr,
    registration: Registration,
}

impl Node {
    /// Binds `listen` and registers the bound port under `service`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Server` if binding fails or
    /// `RuntimeError::Registry` if registration fails.
    pub async fn bind(
        listen: &ListenConfig,
        registry: Arc<dyn Registry>,
        service: &str,
    ) -> Result<Self, RuntimeError> {
        let listener = TcpListener::bind(listen.bind_addr()).await?;
        let local_addr = listener.local_addr()?;
        let advertised = format!("{}:{}", listen.advertise_host, local_addr.port());
        let instance = ServiceInstance::new(generate_instance_id(service), service, &advertised)?;
        let registration = Registration::start(registry, instance, HEARTBEAT_INTERVAL).await?;

        info!(service, %local_addr, advertised = %advertised, "listening");
        Ok(Self {
            listener,
            local_addr,
            registration,
        })
    }

    /// Bound socket address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Instance id used in the registry.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.registration.instance().instance_id
    }

    /// Serves `router` until `cancel` fires, then drains in-flight requests
    /// and deregisters. A server failure cancels `cancel` so sibling tasks
    /// stop too; deregistration runs either way.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Server` if the server fails.
    pub async fn serve(self, router: Router, cancel: CancellationToken) -> Result<(), RuntimeError> {
        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(cancel.clone().cancelled_owned())
            .await;
        cancel.cancel();
        self.registration.deregister(DEREGISTER_TIMEOUT).await;
        result.map_err(RuntimeError::from)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::routing::get;
    use bookstore_discovery::InMemoryRegistry;

    use super::*;

    #[tokio::test]
    async fn test_node_registers_bound_port_and_deregisters_on_shutdown() {
        // Arrange
        let registry = Arc::new(InMemoryRegistry::new());
        let node = Node::bind(&ListenConfig::loopback(), registry.clone(), "books")
            .await
            .unwrap();
        let port = node.local_addr().port();
        assert!(node.instance_id().starts_with("books-"));
        let cancel = CancellationToken::new();
        let router = Router::new().route("/health", get(|| async { "ok" }));
        let server = tokio::spawn(node.serve(router, cancel.clone()));

        // Act
        let discovered = registry.discover("books").await.unwrap();
        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), server).await;

        // Assert
        assert_eq!(discovered, vec![format!("127.0.0.1:{port}")]);
        assert!(matches!(result, Ok(Ok(Ok(())))));
        assert!(registry.discover("books").await.unwrap().is_empty());
    }
}
