//! Bookstore API gateway entry point.

use std::sync::Arc;

use tracing::info;

use bookstore_api::auth::TokenIssuer;
use bookstore_api::config::ApiSettings;
use bookstore_api::error::AppError;
use bookstore_api::server::{self, API_SERVICE};
use bookstore_api::state::AppState;
use bookstore_rpc::RpcClient;
use bookstore_runtime::config::{BackendConfig, ListenConfig};
use bookstore_runtime::shutdown::shutdown_token;
use bookstore_runtime::{Node, RuntimeError, backends, telemetry};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let _telemetry = telemetry::init(API_SERVICE).map_err(RuntimeError::from)?;

    info!("Starting bookstore API gateway");

    // Read configuration from environment.
    let listen = ListenConfig::from_env(8080)?;
    let backend_config = BackendConfig::from_env();
    let settings = ApiSettings::from_env()?;

    // Connect backends.
    let registry = backends::registry(&backend_config)?;
    let bus = backends::event_bus(&backend_config)?;
    let cache = backends::cache(&backend_config).await?;
    let client = Arc::new(RpcClient::new(Arc::clone(&registry), settings.rpc_timeout)?);

    // Build application state.
    let app_state = AppState::new(
        client.clone(),
        client,
        cache,
        bus.producer,
        TokenIssuer::new(&settings.jwt_secret, settings.jwt_ttl),
    )
    .with_cache_ttl(settings.cache_ttl);

    let cancel = shutdown_token();
    let node = Node::bind(&listen, registry, API_SERVICE).await?;

    server::run(node, app_state, cancel).await?;
    Ok(())
}
