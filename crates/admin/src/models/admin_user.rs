//! Admin user domain types.

use chrono::{DateTime, Utc};

use delicias_core::{AdminUserId, Email};

// Re-export AdminRole from core for convenience
pub use delicias_core::AdminRole;

/// A back office account.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an admin user.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub email: Email,
    pub name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role: AdminRole,
}
