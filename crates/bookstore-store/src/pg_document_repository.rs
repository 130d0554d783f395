//! `PostgreSQL` implementation of the `Repository` trait.
//!
//! Documents are stored as JSONB bodies keyed by `(collection, id)`. Filters
//! become `body->>field` predicates from `Document::conditions`, and
//! `Document::matches` runs over the returned rows for anything a document
//! type does not express as a condition.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use bookstore_core::error::DomainError;
use bookstore_core::model::{Document, FieldCondition};
use bookstore_core::repository::Repository;

/// PostgreSQL-backed document repository for one collection.
#[derive(Debug)]
pub struct PgDocumentRepository<T> {
    pool: PgPool,
    _documents: PhantomData<fn() -> T>,
}

impl<T> Clone for PgDocumentRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _documents: PhantomData,
        }
    }
}

impl<T: Document> PgDocumentRepository<T> {
    /// Creates a new `PgDocumentRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _documents: PhantomData,
        }
    }
}

fn db_error(err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

fn decode<T: Document>(body: serde_json::Value) -> Result<T, DomainError> {
    serde_json::from_value(body).map_err(|e| {
        DomainError::Infrastructure(format!("corrupt {} document: {e}", T::COLLECTION))
    })
}

/// `SELECT body` for the documents of `T::COLLECTION` satisfying the
/// conditions of `filter`. Field names and values are both bound.
fn select_matching<T: Document>(filter: &T::Filter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("SELECT body FROM documents WHERE collection = ");
    query.push_bind(T::COLLECTION);
    for condition in T::conditions(filter) {
        match condition {
            FieldCondition::Equals(field, value) => {
                query.push(" AND body->>");
                query.push_bind(field);
                query.push(" = ");
                query.push_bind(value);
            }
            FieldCondition::Contains(field, value) => {
                query.push(" AND strpos(body->>");
                query.push_bind(field);
                query.push(", ");
                query.push_bind(value);
                query.push(") > 0");
            }
        }
    }
    query.push(" ORDER BY created_at, id");
    query
}

#[async_trait]
impl<T: Document> Repository<T> for PgDocumentRepository<T> {
    async fn add(&self, draft: T::Draft) -> Result<T, DomainError> {
        let document = T::from_draft(Uuid::new_v4().to_string(), draft);
        let body = serde_json::to_value(&document)?;

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(T::COLLECTION)
            .bind(document.id())
            .bind(&body)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;

        debug!(collection = T::COLLECTION, id = document.id(), "document inserted");
        Ok(document)
    }

    async fn get(&self, filter: &T::Filter) -> Result<Vec<T>, DomainError> {
        let rows: Vec<(serde_json::Value,)> = select_matching::<T>(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;

        let mut documents = Vec::with_capacity(rows.len());
        for (body,) in rows {
            let document: T = decode(body)?;
            if document.matches(filter) {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>, DomainError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = $1 AND id = $2")
                .bind(T::COLLECTION)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error(&e))?;

        row.map(|(body,)| decode(body)).transpose()
    }

    async fn update(&self, id: &str, patch: &T::Patch) -> Result<Option<T>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error(&e))?;

        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(T::COLLECTION)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error(&e))?;

        let Some((body,)) = row else {
            tx.rollback().await.map_err(|e| db_error(&e))?;
            return Ok(None);
        };

        let mut document: T = decode(body)?;
        document.apply_patch(patch);
        let body = serde_json::to_value(&document)?;

        sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(T::COLLECTION)
            .bind(id)
            .bind(&body)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(&e))?;

        tx.commit().await.map_err(|e| db_error(&e))?;

        debug!(collection = T::COLLECTION, id, "document updated");
        Ok(Some(document))
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(T::COLLECTION)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;

        Ok(result.rows_affected() > 0)
    }
}
