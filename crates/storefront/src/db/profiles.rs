//! Wholesale buyer profiles.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicias_core::{ApprovalStatus, Email, ProfileId};

use super::RepositoryError;
use crate::models::profile::{BusinessDetails, NewProfile, Profile};

const PROFILE_COLUMNS: &str = "id, email, email_verified, approval_status, business_name, rut, \
     contact_name, phone, address, comuna, city, created_at, reviewed_at";

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: ProfileId,
    email: String,
    email_verified: bool,
    approval_status: ApprovalStatus,
    business_name: String,
    rut: String,
    contact_name: String,
    phone: String,
    address: String,
    comuna: String,
    city: String,
    created_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            email_verified: row.email_verified,
            approval_status: row.approval_status,
            business: BusinessDetails {
                business_name: row.business_name,
                rut: row.rut,
                contact_name: row.contact_name,
                phone: row.phone,
                address: row.address,
                comuna: row.comuna,
                city: row.city,
            },
            created_at: row.created_at,
            reviewed_at: row.reviewed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileWithHashRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    password_hash: String,
}

/// Repository for buyer profiles.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM tienda.profile WHERE id = $1");
        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    /// Get a profile by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Profile>, RepositoryError> {
        let sql =
            format!("SELECT {PROFILE_COLUMNS} FROM tienda.profile WHERE lower(email) = $1");
        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    /// Get a profile together with its password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Profile, String)>, RepositoryError> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS}, password_hash FROM tienda.profile WHERE lower(email) = $1"
        );
        let Some(row) = sqlx::query_as::<_, ProfileWithHashRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some((Profile::try_from(row.profile)?, row.password_hash)))
    }

    /// Create a pending, unverified profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(&self, new: &NewProfile) -> Result<Profile, RepositoryError> {
        let sql = format!(
            "INSERT INTO tienda.profile \
                 (email, password_hash, business_name, rut, contact_name, phone, address, comuna, city) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PROFILE_COLUMNS}"
        );
        let business = &new.business;
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(new.email.as_str())
            .bind(&new.password_hash)
            .bind(&business.business_name)
            .bind(&business.rut)
            .bind(&business.contact_name)
            .bind(&business.phone)
            .bind(&business.address)
            .bind(&business.comuna)
            .bind(&business.city)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "email"))?;

        Profile::try_from(row)
    }

    /// Mark the profile's email as verified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn mark_email_verified(&self, id: ProfileId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE tienda.profile SET email_verified = TRUE, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Replace the password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn update_password(
        &self,
        id: ProfileId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE tienda.profile SET password_hash = $2, updated_at = now() WHERE id = $1",
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
