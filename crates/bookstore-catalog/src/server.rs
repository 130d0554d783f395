//! Runs a catalog node: RPC server plus ingesters, until cancelled.

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use bookstore_ingester::{DeadLetterSink, IngesterConfig, TopicDeadLetterSink};
use bookstore_runtime::backends::EventBus;
use bookstore_runtime::config::IngestSettings;
use bookstore_runtime::{Node, RuntimeError};

use crate::ingest::spawn_ingesters;
use crate::rpc;
use crate::service::CatalogService;

/// Consumer group of the catalog ingesters.
pub const GROUP_ID: &str = "books";

/// Ingester tuning for the catalog from `settings`.
#[must_use]
pub fn ingester_config(settings: IngestSettings) -> IngesterConfig {
    IngesterConfig {
        idle_interval: settings.idle_interval,
        max_attempts: settings.max_attempts,
        ..IngesterConfig::new(GROUP_ID)
    }
}

/// The RPC router with request tracing, bound to `service`.
pub fn app(service: Arc<CatalogService>) -> Router {
    rpc::router()
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Starts the ingesters, serves RPC on `node` until `cancel` fires, then
/// waits for the ingesters to stop.
///
/// # Errors
///
/// Returns `RuntimeError::Server` if the server fails.
pub async fn run(
    node: Node,
    service: Arc<CatalogService>,
    bus: EventBus,
    config: IngesterConfig,
    cancel: CancellationToken,
) -> Result<(), RuntimeError> {
    let dead_letters: Arc<dyn DeadLetterSink> =
        Arc::new(TopicDeadLetterSink::new(bus.producer));
    let ingesters = spawn_ingesters(&service, &bus.consumers, &dead_letters, &config, &cancel);
    info!(count = ingesters.len(), "catalog ingesters started");

    let result = node.serve(app(service), cancel.clone()).await;

    cancel.cancel();
    for handle in ingesters {
        match handle.task.await {
            Ok(restarts) => info!(topic = handle.topic, restarts, "ingester stopped"),
            Err(e) => warn!(topic = handle.topic, error = %e, "ingester task failed"),
        }
    }
    result
}
