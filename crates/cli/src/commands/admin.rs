//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! df-cli admin create -e marta@deliciasflorencia.cl -n "Marta Rojas" -r super_admin -p '...'
//! df-cli admin list
//! df-cli admin set-password -e marta@deliciasflorencia.cl -p '...'
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use delicias_admin::db::{self, AdminUserRepository, RepositoryError};
use delicias_admin::services::{AuthError, AuthService};
use delicias_core::{AdminRole, Email};
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No admin has this email.
    #[error("No admin user with email: {0}")]
    UnknownUser(String),

    /// Account creation or password change refused.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

async fn connect() -> Result<PgPool, AdminError> {
    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    Ok(db::create_pool(&database_url).await?)
}

fn parse_role(role: &str) -> Result<AdminRole, AdminError> {
    role.trim()
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))
}

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `role` - Admin's role (`super_admin`, `admin`, or `viewer`)
/// * `password` - Initial password, hashed with Argon2id
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns an error for a bad role, email or password, or if the email is
/// already taken.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<i32, AdminError> {
    let role = parse_role(role)?;
    let pool = connect().await?;

    tracing::info!("Creating admin user: {} ({})", email, role);
    let admin = AuthService::new(&pool)
        .create_admin(email, name, role, password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role
    );

    Ok(admin.id.as_i32())
}

/// List every admin user.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list_users() -> Result<(), AdminError> {
    let pool = connect().await?;
    let admins = AdminUserRepository::new(&pool).list().await?;

    tracing::info!("Admin users ({})", admins.len());
    for admin in &admins {
        tracing::info!(
            "  {:>4}  {:<12} {:<32} {}",
            admin.id,
            admin.role,
            admin.email,
            admin.name
        );
    }

    Ok(())
}

/// Replace the password of the admin with `email`.
///
/// # Errors
///
/// Returns an error for an unknown email or a weak password.
pub async fn set_password(email: &str, password: &str) -> Result<(), AdminError> {
    let parsed = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let pool = connect().await?;

    let (admin, _) = AdminUserRepository::new(&pool)
        .get_with_password_hash(&parsed)
        .await?
        .ok_or_else(|| AdminError::UnknownUser(email.to_owned()))?;

    AuthService::new(&pool).set_password(admin.id, password).await?;

    tracing::info!("Password updated for {} (ID {})", admin.email, admin.id);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("super_admin").unwrap(), AdminRole::SuperAdmin);
        assert_eq!(parse_role(" viewer ").unwrap(), AdminRole::Viewer);
        assert!(matches!(parse_role("owner"), Err(AdminError::InvalidRole(_))));
    }
}
