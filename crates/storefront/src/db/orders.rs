//! Wholesale orders placed by buyers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use delicias_core::{OrderId, OrderPayload, OrderStatus, ProfileId};

use super::RepositoryError;
use crate::models::order::{Order, OrderSummary};

const ORDER_COLUMNS: &str = "id, profile_id, payload, total, status, notes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    profile_id: ProfileId,
    payload: Json<serde_json::Value>,
    total: Decimal,
    status: OrderStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payload: OrderPayload = serde_json::from_value(row.payload.0).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payload for order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            profile_id: row.profile_id,
            payload,
            total: row.total,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    total: Decimal,
    status: OrderStatus,
    total_units: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: row.id,
            total: row.total,
            status: row.status,
            total_units: row
                .total_units
                .and_then(|units| u32::try_from(units).ok())
                .unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

/// Repository for a buyer's orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new `pending` order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        profile_id: ProfileId,
        payload: &OrderPayload,
        notes: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let json = serde_json::to_value(payload)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable payload: {e}")))?;
        let sql = format!(
            "INSERT INTO tienda.\"order\" (profile_id, payload, total, notes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ORDER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(profile_id)
            .bind(Json(json))
            .bind(payload.totals.total)
            .bind(notes)
            .fetch_one(self.pool)
            .await?;

        Order::try_from(row)
    }

    /// Orders placed by a buyer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_profile(
        &self,
        profile_id: ProfileId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            "SELECT id, total, status, \
                    (payload -> 'totals' ->> 'total_units')::bigint AS total_units, \
                    created_at \
             FROM tienda.\"order\" \
             WHERE profile_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(profile_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// A single order, only if it belongs to `profile_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if the stored payload cannot be read.
    pub async fn get_for_profile(
        &self,
        id: OrderId,
        profile_id: ProfileId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM tienda.\"order\" WHERE id = $1 AND profile_id = $2"
        );
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(profile_id)
            .fetch_optional(self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }
}
