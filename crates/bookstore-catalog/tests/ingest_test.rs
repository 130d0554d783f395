//! Integration tests for catalog event ingestion.

mod common;

use std::sync::Arc;

use bookstore_bus::{ConsumerFactory, InMemoryEventLog};
use bookstore_catalog::CatalogService;
use bookstore_catalog::ingest::spawn_ingesters;
use bookstore_core::event::{
    CreateAuthor, CreateBook, DeleteAuthor, DeleteBook, DomainEvent, UpdateBook,
};
use bookstore_core::model::{AllAuthors, BookFilter};
use bookstore_core::repository::Repository;
use bookstore_ingester::{DeadLetterSink, IngesterHandle, TopicDeadLetterSink};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

struct Harness {
    log: InMemoryEventLog,
    service: Arc<CatalogService>,
    handles: Vec<IngesterHandle>,
    cancel: CancellationToken,
}

impl Harness {
    fn start() -> Self {
        let log = InMemoryEventLog::new();
        let service = common::in_memory_service();
        let consumers: Arc<dyn ConsumerFactory> = Arc::new(log.clone());
        let dead_letters: Arc<dyn DeadLetterSink> =
            Arc::new(TopicDeadLetterSink::new(Arc::new(log.clone())));
        let cancel = CancellationToken::new();
        let handles = spawn_ingesters(
            &service,
            &consumers,
            &dead_letters,
            &common::fast_config(),
            &cancel,
        );
        Self {
            log,
            service,
            handles,
            cancel,
        }
    }

    async fn stop(self) {
        self.cancel.cancel();
        for handle in self.handles {
            assert_eq!(handle.task.await.unwrap(), 0, "{} restarted", handle.topic);
        }
    }
}

#[tokio::test]
async fn test_create_then_repeated_delete_leaves_no_author() {
    // Arrange
    let harness = Harness::start();
    common::publish(
        &harness.log,
        CreateAuthor {
            name: "N. K. Jemisin".to_owned(),
            date_of_birth: None,
        },
    )
    .await;
    common::wait_for(&harness.handles, CreateAuthor::TOPIC, 1).await;
    let authors = harness.service.authors().get(&AllAuthors).await.unwrap();
    assert_eq!(authors.len(), 1);
    let id = authors[0].id.clone();

    // Act
    common::publish(&harness.log, DeleteAuthor { id: id.clone() }).await;
    common::publish(&harness.log, DeleteAuthor { id }).await;
    let counts = common::wait_for(&harness.handles, DeleteAuthor::TOPIC, 2).await;

    // Assert
    assert_eq!(counts.applied, 2);
    assert_eq!(counts.dead_lettered, 0);
    assert!(harness.service.authors().get(&AllAuthors).await.unwrap().is_empty());
    assert_eq!(common::lag(&harness.log, DeleteAuthor::TOPIC), 0);
    harness.stop().await;
}

#[tokio::test]
async fn test_invalid_create_is_dead_lettered_and_ingestion_continues() {
    // Arrange
    let harness = Harness::start();
    let valid = CreateBook {
        title: "The Fifth Season".to_owned(),
        author_id: "a-1".to_owned(),
        synopsis: "The world ends".to_owned(),
        image_url: String::new(),
        genre: "fantasy".to_owned(),
    };
    let untitled = CreateBook {
        title: String::new(),
        ..valid.clone()
    };

    // Act
    common::publish(&harness.log, untitled).await;
    common::publish(&harness.log, valid).await;
    let counts = common::wait_for(&harness.handles, CreateBook::TOPIC, 2).await;

    // Assert
    assert_eq!(counts.applied, 1);
    assert_eq!(counts.dead_lettered, 1);
    let books = harness.service.books().get(&BookFilter::default()).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "The Fifth Season");

    let dead = harness.log.messages("createBook.dlq");
    assert_eq!(dead.len(), 1);
    let letter: Value = serde_json::from_slice(&dead[0].payload).unwrap();
    assert_eq!(letter["code"], "validation_error");
    assert_eq!(letter["sourceTopic"], "createBook");
    harness.stop().await;
}

#[tokio::test]
async fn test_update_and_delete_of_unknown_book_are_no_ops() {
    let harness = Harness::start();

    common::publish(
        &harness.log,
        UpdateBook {
            id: "ghost".to_owned(),
            genre: Some("horror".to_owned()),
            ..UpdateBook::default()
        },
    )
    .await;
    common::publish(&harness.log, DeleteBook { id: "ghost".to_owned() }).await;
    let updates = common::wait_for(&harness.handles, UpdateBook::TOPIC, 1).await;
    let deletes = common::wait_for(&harness.handles, DeleteBook::TOPIC, 1).await;

    assert_eq!(updates.applied, 1);
    assert_eq!(deletes.applied, 1);
    assert!(harness.log.messages("updateBook.dlq").is_empty());
    assert!(harness.log.messages("deleteBook.dlq").is_empty());
    harness.stop().await;
}

#[tokio::test]
async fn test_update_after_create_is_applied() {
    // Arrange
    let harness = Harness::start();
    common::publish(
        &harness.log,
        CreateBook {
            title: "Parable of the Sower".to_owned(),
            author_id: "a-2".to_owned(),
            synopsis: "Earthseed".to_owned(),
            image_url: String::new(),
            genre: "scifi".to_owned(),
        },
    )
    .await;
    common::wait_for(&harness.handles, CreateBook::TOPIC, 1).await;
    let id = harness.service.books().get(&BookFilter::default()).await.unwrap()[0]
        .id
        .clone();

    // Act
    common::publish(
        &harness.log,
        UpdateBook {
            id: id.clone(),
            genre: Some("dystopia".to_owned()),
            ..UpdateBook::default()
        },
    )
    .await;
    common::wait_for(&harness.handles, UpdateBook::TOPIC, 1).await;

    // Assert
    let book = harness.service.books().get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(book.genre, "dystopia");
    assert_eq!(book.title, "Parable of the Sower");
    harness.stop().await;
}
