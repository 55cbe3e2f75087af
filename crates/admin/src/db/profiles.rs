//! Buyer profiles under review.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicias_core::{ApprovalStatus, Email, ProfileId};

use super::RepositoryError;
use crate::models::profile::Profile;

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
            RepositoryError::DataCorruption(format!("invalid email for profile {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            email,
            email_verified: row.email_verified,
            approval_status: row.approval_status,
            business_name: row.business_name,
            rut: row.rut,
            contact_name: row.contact_name,
            phone: row.phone,
            address: row.address,
            comuna: row.comuna,
            city: row.city,
            created_at: row.created_at,
            reviewed_at: row.reviewed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatusCountRow {
    approval_status: ApprovalStatus,
    count: i64,
}

/// Number of profiles in each review state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl ProfileCounts {
    /// Count for one status.
    #[must_use]
    pub const fn get(&self, status: ApprovalStatus) -> i64 {
        match status {
            ApprovalStatus::Pending => self.pending,
            ApprovalStatus::Approved => self.approved,
            ApprovalStatus::Rejected => self.rejected,
        }
    }
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

    /// Profiles in `status`, oldest first so the queue is worked in order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_status(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<Profile>, RepositoryError> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM tienda.profile \
             WHERE approval_status = $1 \
             ORDER BY created_at"
        );
        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(status)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Profile::try_from)
            .collect()
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

    /// Record an approval decision and stamp `reviewed_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn set_status(
        &self,
        id: ProfileId,
        status: ApprovalStatus,
    ) -> Result<Profile, RepositoryError> {
        let sql = format!(
            "UPDATE tienda.profile \
             SET approval_status = $2, reviewed_at = now(), updated_at = now() \
             WHERE id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        );
        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
            .and_then(Profile::try_from)
    }

    /// Count profiles per review state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<ProfileCounts, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusCountRow>(
            "SELECT approval_status, count(*) AS count FROM tienda.profile GROUP BY approval_status",
        )
        .fetch_all(self.pool)
        .await?;

        let mut counts = ProfileCounts::default();
        for row in rows {
            match row.approval_status {
                ApprovalStatus::Pending => counts.pending = row.count,
                ApprovalStatus::Approved => counts.approved = row.count,
                ApprovalStatus::Rejected => counts.rejected = row.count,
            }
        }
        Ok(counts)
    }
}
