//! Ingester wiring for the user topics.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use bookstore_bus::ConsumerFactory;
use bookstore_core::event::{CreateUser, DomainEvent, UpdateUser};
use bookstore_ingester::{ApplyEvent, DeadLetterSink, Ingester, IngesterConfig, IngesterHandle};

use crate::service::AuthService;

fn spawn<E>(
    service: &Arc<AuthService>,
    consumers: &Arc<dyn ConsumerFactory>,
    dead_letters: &Arc<dyn DeadLetterSink>,
    config: &IngesterConfig,
    cancel: &CancellationToken,
) -> IngesterHandle
where
    E: DomainEvent,
    AuthService: ApplyEvent<E>,
{
    let apply: Arc<dyn ApplyEvent<E>> = Arc::clone(service) as Arc<dyn ApplyEvent<E>>;
    Ingester::new(
        Arc::clone(consumers),
        apply,
        Arc::clone(dead_letters),
        config.clone(),
    )
    .spawn(cancel.clone())
}

/// Starts ingesters for `createUser` and `updateUser`.
#[must_use]
pub fn spawn_ingesters(
    service: &Arc<AuthService>,
    consumers: &Arc<dyn ConsumerFactory>,
    dead_letters: &Arc<dyn DeadLetterSink>,
    config: &IngesterConfig,
    cancel: &CancellationToken,
) -> Vec<IngesterHandle> {
    vec![
        spawn::<CreateUser>(service, consumers, dead_letters, config, cancel),
        spawn::<UpdateUser>(service, consumers, dead_letters, config, cancel),
    ]
}
