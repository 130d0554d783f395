//! Document store database schema.

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};

/// Migrations shared by every service that persists documents.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies any pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is
/// inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}
