//! Standalone mode: the gateway and both backends in one process, wired to
//! shared in-memory registry, event log and cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use bookstore_auth::AuthService;
use bookstore_auth::model::UserRecord;
use bookstore_auth::password::Passwords;
use bookstore_bus::InMemoryEventLog;
use bookstore_cache::{Cache, InMemoryCache};
use bookstore_catalog::CatalogService;
use bookstore_core::model::{Author, Book};
use bookstore_discovery::{InMemoryRegistry, Registry};
use bookstore_rpc::RpcClient;
use bookstore_rpc::protocol::{AUTH_SERVICE, BOOKS_SERVICE};
use bookstore_runtime::backends::EventBus;
use bookstore_runtime::config::{IngestSettings, ListenConfig};
use bookstore_runtime::{Node, RuntimeError};
use bookstore_store::InMemoryRepository;

use crate::auth::TokenIssuer;
use crate::config::ApiSettings;
use crate::error::AppError;
use crate::server::{self, API_SERVICE};
use crate::state::AppState;

/// What a standalone deployment is built from.
pub struct StandaloneConfig {
    /// Gateway settings.
    pub settings: ApiSettings,
    /// Ingester tuning of both backends.
    pub ingest: IngestSettings,
    /// Usernames granted the admin role.
    pub admins: Vec<String>,
    /// Password hasher of the auth backend.
    pub passwords: Passwords,
}

impl StandaloneConfig {
    /// Defaults with a one-second ingest idle interval.
    #[must_use]
    pub fn new(settings: ApiSettings) -> Self {
        Self {
            settings,
            ingest: IngestSettings {
                idle_interval: Duration::from_secs(1),
                ..IngestSettings::default()
            },
            admins: Vec::new(),
            passwords: Passwords::new(),
        }
    }
}

/// A running catalog and auth backend plus the gateway state that reaches
/// them.
pub struct Standalone {
    state: AppState,
    log: InMemoryEventLog,
    registry: Arc<InMemoryRegistry>,
    backends: Vec<JoinHandle<Result<(), RuntimeError>>>,
    cancel: CancellationToken,
}

impl Standalone {
    /// Starts both backends on loopback ports and builds the gateway state.
    /// Everything stops when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if a backend cannot bind or register.
    pub async fn start(config: StandaloneConfig, cancel: CancellationToken) -> Result<Self, AppError> {
        let registry = Arc::new(InMemoryRegistry::new());
        let log = InMemoryEventLog::new();
        let bus = EventBus::in_memory(&log);
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());

        let catalog = CatalogService::new(
            Arc::new(InMemoryRepository::<Author>::new()),
            Arc::new(InMemoryRepository::<Book>::new()),
        )
        .with_cache(Arc::clone(&cache));
        let catalog_node = Node::bind(&ListenConfig::loopback(), registry.clone(), BOOKS_SERVICE).await?;

        let users = AuthService::new(
            Arc::new(InMemoryRepository::<UserRecord>::new()),
            config.passwords,
        )
        .with_admins(config.admins);
        let auth_node = Node::bind(&ListenConfig::loopback(), registry.clone(), AUTH_SERVICE).await?;

        let backends = vec![
            tokio::spawn(bookstore_catalog::server::run(
                catalog_node,
                Arc::new(catalog),
                bus.clone(),
                bookstore_catalog::server::ingester_config(config.ingest),
                cancel.clone(),
            )),
            tokio::spawn(bookstore_auth::server::run(
                auth_node,
                Arc::new(users),
                bus.clone(),
                bookstore_auth::server::ingester_config(config.ingest),
                cancel.clone(),
            )),
        ];
        info!("standalone backends started");

        let settings = config.settings;
        let client = Arc::new(RpcClient::new(registry.clone(), settings.rpc_timeout)?);
        let state = AppState::new(
            client.clone(),
            client,
            cache,
            bus.producer,
            TokenIssuer::new(&settings.jwt_secret, settings.jwt_ttl),
        )
        .with_cache_ttl(settings.cache_ttl);

        Ok(Self {
            state,
            log,
            registry,
            backends,
            cancel,
        })
    }

    /// Gateway state wired to the backends.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The shared event log.
    #[must_use]
    pub fn event_log(&self) -> &InMemoryEventLog {
        &self.log
    }

    /// The shared registry.
    #[must_use]
    pub fn registry(&self) -> Arc<dyn Registry> {
        self.registry.clone()
    }

    /// Serves the gateway on `listen` until cancelled, then stops the
    /// backends.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the gateway cannot bind or fails while serving.
    pub async fn serve(self, listen: &ListenConfig) -> Result<(), AppError> {
        let node = Node::bind(listen, self.registry(), API_SERVICE).await?;
        let result = server::run(node, self.state.clone(), self.cancel.clone()).await;
        self.shutdown().await;
        result.map_err(AppError::from)
    }

    /// Cancels everything and waits for the backends to stop.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.backends {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "backend stopped with an error"),
                Err(e) => warn!(error = %e, "backend task failed"),
            }
        }
        info!("standalone backends stopped");
    }
}
