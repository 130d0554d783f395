//! Ingester wiring: one supervised ingester per catalog topic.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use bookstore_bus::ConsumerFactory;
use bookstore_core::event::{CreateAuthor, CreateBook, DeleteAuthor, DeleteBook, DomainEvent, UpdateBook};
use bookstore_ingester::{ApplyEvent, DeadLetterSink, Ingester, IngesterConfig, IngesterHandle};

use crate::service::CatalogService;

/// Starts ingesters for `createAuthor`, `deleteAuthor`, `createBook`,
/// `updateBook` and `deleteBook`, all applying through `service`.
#[must_use]
pub fn spawn_ingesters(
    service: &Arc<CatalogService>,
    consumers: &Arc<dyn ConsumerFactory>,
    dead_letters: &Arc<dyn DeadLetterSink>,
    config: &IngesterConfig,
    cancel: &CancellationToken,
) -> Vec<IngesterHandle> {
    let spawner = Spawner {
        service,
        consumers,
        dead_letters,
        config,
        cancel,
    };
    vec![
        spawner.spawn::<CreateAuthor>(),
        spawner.spawn::<DeleteAuthor>(),
        spawner.spawn::<CreateBook>(),
        spawner.spawn::<UpdateBook>(),
        spawner.spawn::<DeleteBook>(),
    ]
}

struct Spawner<'a> {
    service: &'a Arc<CatalogService>,
    consumers: &'a Arc<dyn ConsumerFactory>,
    dead_letters: &'a Arc<dyn DeadLetterSink>,
    config: &'a IngesterConfig,
    cancel: &'a CancellationToken,
}

impl Spawner<'_> {
    fn spawn<E>(&self) -> IngesterHandle
    where
        E: DomainEvent,
        CatalogService: ApplyEvent<E>,
    {
        let apply: Arc<dyn ApplyEvent<E>> = Arc::clone(self.service) as Arc<dyn ApplyEvent<E>>;
        Ingester::new(
            Arc::clone(self.consumers),
            apply,
            Arc::clone(self.dead_letters),
            self.config.clone(),
        )
        .spawn(self.cancel.clone())
    }
}
