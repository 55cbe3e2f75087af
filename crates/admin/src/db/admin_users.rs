//! Admin user repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicias_core::{AdminRole, AdminUserId, Email};

use super::RepositoryError;
use crate::models::admin_user::{AdminUser, NewAdminUser};

const ADMIN_USER_COLUMNS: &str = "id, email, name, role, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AdminUserRow {
    id: AdminUserId,
    email: String,
    name: String,
    role: AdminRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            name: row.name,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdminUserWithHashRow {
    #[sqlx(flatten)]
    user: AdminUserRow,
    password_hash: String,
}

/// Repository for admin user database operations.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an admin user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let sql = format!("SELECT {ADMIN_USER_COLUMNS} FROM admin.admin_user WHERE id = $1");
        sqlx::query_as::<_, AdminUserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(AdminUser::try_from)
            .transpose()
    }

    /// Get an admin user with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let sql = format!(
            "SELECT {ADMIN_USER_COLUMNS}, password_hash FROM admin.admin_user WHERE lower(email) = $1"
        );
        let Some(row) = sqlx::query_as::<_, AdminUserWithHashRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some((AdminUser::try_from(row.user)?, row.password_hash)))
    }

    /// List all admin users, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let sql = format!("SELECT {ADMIN_USER_COLUMNS} FROM admin.admin_user ORDER BY name");
        sqlx::query_as::<_, AdminUserRow>(&sql)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(AdminUser::try_from)
            .collect()
    }

    /// Create a new admin user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(&self, new: &NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let sql = format!(
            "INSERT INTO admin.admin_user (email, name, password_hash, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ADMIN_USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AdminUserRow>(&sql)
            .bind(new.email.as_str())
            .bind(&new.name)
            .bind(&new.password_hash)
            .bind(new.role)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "admin user"))?;

        AdminUser::try_from(row)
    }

    /// Replace an admin's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    pub async fn update_password(
        &self,
        id: AdminUserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE admin.admin_user SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
