//! Bookstore auth service entry point.

use std::sync::Arc;

use tracing::info;

use bookstore_auth::password::Passwords;
use bookstore_auth::{AuthService, server};
use bookstore_rpc::protocol::AUTH_SERVICE;
use bookstore_runtime::config::{self, BackendConfig, IngestSettings, ListenConfig, process_env};
use bookstore_runtime::shutdown::shutdown_token;
use bookstore_runtime::{Node, RuntimeError, backends, telemetry};

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    let _telemetry = telemetry::init(AUTH_SERVICE)?;

    info!("Starting bookstore auth service");

    let listen = ListenConfig::from_env(8082)?;
    let backend_config = BackendConfig::from_env();
    let ingester_config = server::ingester_config(IngestSettings::from_env()?);
    let admins = config::list(&process_env, "ADMIN_USERNAMES");
    info!(admins = admins.len(), "admin usernames configured");

    let registry = backends::registry(&backend_config)?;
    let bus = backends::event_bus(&backend_config)?;
    let pool = backends::pg_pool(&backend_config).await?;

    let service = AuthService::new(backends::repository(pool.as_ref()), Passwords::new())
        .with_admins(admins);

    let cancel = shutdown_token();
    let node = Node::bind(&listen, registry, AUTH_SERVICE).await?;

    server::run(node, Arc::new(service), bus, ingester_config, cancel).await
}
