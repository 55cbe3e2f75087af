//! Single-use email tokens.
//!
//! Only the SHA-256 of a token is stored; the raw value exists in the email
//! link and nowhere else.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicias_core::{ProfileId, TokenPurpose};

use super::RepositoryError;

/// The profile's earlier tokens of the same purpose, plus every expired token.
const PRUNE_SQL: &str = "DELETE FROM tienda.email_token \
     WHERE (profile_id = $1 AND purpose = $2) OR expires_at <= now()";

/// Repository for email verification and password reset tokens.
pub struct EmailTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EmailTokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new token hash.
    ///
    /// Older tokens of the same purpose for this profile stop working, and
    /// expired tokens of any profile are deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails.
    pub async fn issue(
        &self,
        profile_id: ProfileId,
        purpose: TokenPurpose,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(PRUNE_SQL)
            .bind(profile_id)
            .bind(purpose)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO tienda.email_token (profile_id, purpose, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(profile_id)
        .bind(purpose)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Consume a live token, returning the profile it belongs to.
    ///
    /// Returns `None` if the token is unknown, expired, already used, or was
    /// issued for another purpose.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume(
        &self,
        purpose: TokenPurpose,
        token_hash: &str,
    ) -> Result<Option<ProfileId>, RepositoryError> {
        let profile_id = sqlx::query_scalar::<_, ProfileId>(
            "UPDATE tienda.email_token SET used_at = now() \
             WHERE token_hash = $1 AND purpose = $2 AND used_at IS NULL AND expires_at > now() \
             RETURNING profile_id",
        )
        .bind(token_hash)
        .bind(purpose)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile_id)
    }

    /// Whether a live token exists, without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_live(
        &self,
        purpose: TokenPurpose,
        token_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let live = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM tienda.email_token \
             WHERE token_hash = $1 AND purpose = $2 AND used_at IS NULL AND expires_at > now())",
        )
        .bind(token_hash)
        .bind(purpose)
        .fetch_one(self.pool)
        .await?;

        Ok(live)
    }
}
