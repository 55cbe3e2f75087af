//! Distributor listings, as seen by the public site.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicias_core::{ApprovalStatus, Coordinates, SocioId};

use super::RepositoryError;
use crate::models::socio::{NewSocioApplication, Socio};

const SOCIO_COLUMNS: &str = "id, name, address, comuna, region, phone, email, instagram, \
     latitude, longitude, status, is_public, created_at";

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

    /// Approved, public socios that have been geocoded, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_public(&self) -> Result<Vec<Socio>, RepositoryError> {
        let sql = format!(
            "SELECT {SOCIO_COLUMNS} FROM tienda.socio \
             WHERE status = 'approved' AND is_public \
               AND latitude IS NOT NULL AND longitude IS NOT NULL \
             ORDER BY region, comuna, name"
        );
        sqlx::query_as::<_, SocioRow>(&sql)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Socio::try_from)
            .collect()
    }

    /// Record a partner application as a pending, hidden socio.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a socio with the same name
    /// already exists in that comuna.
    pub async fn create_application(
        &self,
        application: &NewSocioApplication,
    ) -> Result<Socio, RepositoryError> {
        let sql = format!(
            "INSERT INTO tienda.socio (name, address, comuna, region, phone, email, instagram) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SOCIO_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SocioRow>(&sql)
            .bind(&application.name)
            .bind(&application.address)
            .bind(&application.comuna)
            .bind(&application.region)
            .bind(application.phone.as_deref())
            .bind(application.email.as_ref().map(delicias_core::Email::as_str))
            .bind(application.instagram.as_deref())
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "socio"))?;

        Socio::try_from(row)
    }
}
