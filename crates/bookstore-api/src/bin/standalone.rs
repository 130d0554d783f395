//! Runs the gateway, catalog and auth services in one process on in-memory
//! backends.

use tracing::info;

use bookstore_api::config::ApiSettings;
use bookstore_api::error::AppError;
use bookstore_api::standalone::{Standalone, StandaloneConfig};
use bookstore_runtime::config::{self, ListenConfig, process_env};
use bookstore_runtime::shutdown::shutdown_token;
use bookstore_runtime::{RuntimeError, telemetry};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let _telemetry = telemetry::init("standalone").map_err(RuntimeError::from)?;

    info!("Starting bookstore in standalone mode");

    let listen = ListenConfig::from_env(8080)?;
    let mut standalone_config = StandaloneConfig::new(ApiSettings::from_env()?);
    standalone_config.admins = config::list(&process_env, "ADMIN_USERNAMES");

    let standalone = Standalone::start(standalone_config, shutdown_token()).await?;
    standalone.serve(&listen).await
}
