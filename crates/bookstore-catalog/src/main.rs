//! Bookstore catalog service entry point.

use std::sync::Arc;

use tracing::info;

use bookstore_catalog::{CatalogService, server};
use bookstore_rpc::protocol::BOOKS_SERVICE;
use bookstore_runtime::config::{BackendConfig, IngestSettings, ListenConfig};
use bookstore_runtime::shutdown::shutdown_token;
use bookstore_runtime::{Node, RuntimeError, backends, telemetry};

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    let _telemetry = telemetry::init(BOOKS_SERVICE)?;

    info!("Starting bookstore catalog service");

    // Read configuration from environment.
    let listen = ListenConfig::from_env(8081)?;
    let backend_config = BackendConfig::from_env();
    let ingester_config = server::ingester_config(IngestSettings::from_env()?);

    // Connect backends.
    let registry = backends::registry(&backend_config)?;
    let bus = backends::event_bus(&backend_config)?;
    let pool = backends::pg_pool(&backend_config).await?;

    let mut service = CatalogService::new(
        backends::repository(pool.as_ref()),
        backends::repository(pool.as_ref()),
    );
    // An in-memory cache here would be invisible to the gateway.
    if backend_config.redis_uri.is_some() {
        service = service.with_cache(backends::cache(&backend_config).await?);
    }

    let cancel = shutdown_token();
    let node = Node::bind(&listen, registry, BOOKS_SERVICE).await?;

    server::run(node, Arc::new(service), bus, ingester_config, cancel).await
}
