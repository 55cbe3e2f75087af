//! Distributor listings, as managed from the back office.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicias_core::{ApprovalStatus, Coordinates, SocioId};

use super::RepositoryError;
use crate::models::socio::{Socio, SocioInput};

const SOCIO_COLUMNS: &str = "id, name, address, comuna, region, phone, email, instagram, \
     latitude, longitude, status, is_public, created_at, updated_at";

/// Stored coordinate column, kept only while the address is unchanged.
fn kept_coordinate(column: &str) -> String {
    format!(
        "COALESCE(EXCLUDED.{column}, \
             CASE WHEN tienda.socio.address = EXCLUDED.address \
                   AND lower(tienda.socio.comuna) = lower(EXCLUDED.comuna) \
                  THEN tienda.socio.{column} END)"
    )
}

fn upsert_approved_sql() -> String {
    format!(
        "INSERT INTO tienda.socio \
             (name, address, comuna, region, phone, email, instagram, \
              latitude, longitude, status, is_public) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'approved', TRUE) \
         ON CONFLICT (lower(name), lower(comuna)) DO UPDATE SET \
             address = EXCLUDED.address, \
             region = EXCLUDED.region, \
             phone = EXCLUDED.phone, \
             email = EXCLUDED.email, \
             instagram = EXCLUDED.instagram, \
             latitude = {latitude}, \
             longitude = {longitude}, \
             status = 'approved', \
             is_public = TRUE, \
             updated_at = now() \
         RETURNING {SOCIO_COLUMNS}",
        latitude = kept_coordinate("latitude"),
        longitude = kept_coordinate("longitude"),
    )
}

#[derive(sqlx::FromRow)]
struct SocioRow {
    id: SocioId,
    name: String,
    address: String,
    comuna: String,
    region: String,
    phone: Option<String>,
    email: Option<String>,
    instagram: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    status: ApprovalStatus,
    is_public: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SocioRow> for Socio {
    type Error = RepositoryError;

    fn try_from(row: SocioRow) -> Result<Self, Self::Error> {
        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng).map_err(|e| {
                RepositoryError::DataCorruption(format!("socio {}: {e}", row.id))
            })?),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            name: row.name,
            address: row.address,
            comuna: row.comuna,
            region: row.region,
            phone: row.phone,
            email: row.email,
            instagram: row.instagram,
            location,
            status: row.status,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for distributor listings.
pub struct SocioRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SocioRepository<'a> {
    /// Create a new socio repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Socios in `status`, or all of them, ordered by region, comuna and name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<ApprovalStatus>) -> Result<Vec<Socio>, RepositoryError> {
        let sql = format!(
            "SELECT {SOCIO_COLUMNS} FROM tienda.socio \
             WHERE $1::tienda.approval_status IS NULL OR status = $1 \
             ORDER BY region, comuna, name"
        );
        sqlx::query_as::<_, SocioRow>(&sql)
            .bind(status)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Socio::try_from)
            .collect()
    }

    /// Get a socio by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: SocioId) -> Result<Option<Socio>, RepositoryError> {
        let sql = format!("SELECT {SOCIO_COLUMNS} FROM tienda.socio WHERE id = $1");
        sqlx::query_as::<_, SocioRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Socio::try_from)
            .transpose()
    }

    /// Create a socio entered by an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a socio with the same name
    /// already exists in that comuna.
    pub async fn create(
        &self,
        input: &SocioInput,
        status: ApprovalStatus,
        is_public: bool,
    ) -> Result<Socio, RepositoryError> {
        let sql = format!(
            "INSERT INTO tienda.socio \
                 (name, address, comuna, region, phone, email, instagram, status, is_public) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {SOCIO_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SocioRow>(&sql)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.comuna)
            .bind(&input.region)
            .bind(input.phone.as_deref())
            .bind(input.email.as_deref())
            .bind(input.instagram.as_deref())
            .bind(status)
            .bind(is_public)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "socio"))?;

        Socio::try_from(row)
    }

    /// Insert or refresh socios keyed by name and comuna, approved and public.
    ///
    /// Runs in one transaction: either every entry is applied or none is.
    /// Coordinates, when given, replace the stored ones. Without them the
    /// stored pin survives only if the address and comuna are unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn upsert_approved_all(
        &self,
        entries: &[(SocioInput, Option<Coordinates>)],
    ) -> Result<Vec<Socio>, RepositoryError> {
        let sql = upsert_approved_sql();
        let mut tx = self.pool.begin().await?;

        let mut socios = Vec::with_capacity(entries.len());
        for (input, location) in entries {
            let row = sqlx::query_as::<_, SocioRow>(&sql)
                .bind(&input.name)
                .bind(&input.address)
                .bind(&input.comuna)
                .bind(&input.region)
                .bind(input.phone.as_deref())
                .bind(input.email.as_deref())
                .bind(input.instagram.as_deref())
                .bind(location.map(|c| c.latitude()))
                .bind(location.map(|c| c.longitude()))
                .fetch_one(&mut *tx)
                .await?;
            socios.push(Socio::try_from(row)?);
        }

        tx.commit().await?;
        Ok(socios)
    }

    /// Replace the contact details of a socio.
    ///
    /// Changing the address clears stored coordinates so the socio is
    /// geocoded again before reappearing on the map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the socio does not exist, or
    /// `Conflict` if the new name clashes within the comuna.
    pub async fn update(&self, id: SocioId, input: &SocioInput) -> Result<Socio, RepositoryError> {
        let sql = format!(
            "UPDATE tienda.socio SET \
                 name = $2, address = $3, comuna = $4, region = $5, \
                 phone = $6, email = $7, instagram = $8, \
                 latitude = CASE WHEN address = $3 AND comuna = $4 THEN latitude END, \
                 longitude = CASE WHEN address = $3 AND comuna = $4 THEN longitude END, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {SOCIO_COLUMNS}"
        );
        sqlx::query_as::<_, SocioRow>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.comuna)
            .bind(&input.region)
            .bind(input.phone.as_deref())
            .bind(input.email.as_deref())
            .bind(input.instagram.as_deref())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "socio"))?
            .ok_or(RepositoryError::NotFound)
            .and_then(Socio::try_from)
    }

    /// Record an approval decision.
    ///
    /// Rejecting a socio also hides it from the map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the socio does not exist.
    pub async fn set_status(
        &self,
        id: SocioId,
        status: ApprovalStatus,
    ) -> Result<Socio, RepositoryError> {
        let sql = format!(
            "UPDATE tienda.socio SET \
                 status = $2, \
                 is_public = CASE WHEN $2 = 'rejected'::tienda.approval_status THEN FALSE ELSE is_public END, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {SOCIO_COLUMNS}"
        );
        sqlx::query_as::<_, SocioRow>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
            .and_then(Socio::try_from)
    }

    /// Show or hide a socio on the public map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the socio does not exist.
    pub async fn set_visibility(
        &self,
        id: SocioId,
        is_public: bool,
    ) -> Result<Socio, RepositoryError> {
        let sql = format!(
            "UPDATE tienda.socio SET is_public = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {SOCIO_COLUMNS}"
        );
        sqlx::query_as::<_, SocioRow>(&sql)
            .bind(id)
            .bind(is_public)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
            .and_then(Socio::try_from)
    }

    /// Store geocoded coordinates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the socio does not exist.
    pub async fn set_location(
        &self,
        id: SocioId,
        location: Coordinates,
    ) -> Result<Socio, RepositoryError> {
        let sql = format!(
            "UPDATE tienda.socio SET latitude = $2, longitude = $3, updated_at = now() \
             WHERE id = $1 \
             RETURNING {SOCIO_COLUMNS}"
        );
        sqlx::query_as::<_, SocioRow>(&sql)
            .bind(id)
            .bind(location.latitude())
            .bind(location.longitude())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
            .and_then(Socio::try_from)
    }

    /// Delete a socio.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the socio does not exist.
    pub async fn delete(&self, id: SocioId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tienda.socio WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of applications awaiting review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_pending(&self) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM tienda.socio WHERE status = 'pending'")
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
