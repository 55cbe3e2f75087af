//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! df-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (or `ADMIN_DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Both schemas live in the workspace `migrations/` directory and are
//! embedded at compile time:
//!
//! ```text
//! migrations/
//! ├── 20260301000001_create_tienda_schema.sql
//! └── 20260301000002_create_admin_schema.sql
//! ```

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().ok_or(MigrationError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let migrator = sqlx::migrate!("../../migrations");
    tracing::info!(available = migrator.iter().count(), "Running migrations...");
    migrator.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
