//! Wholesale orders, as processed from the back office.

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
    business_name: Option<String>,
    comuna: Option<String>,
    total_units: Option<i64>,
    total: Decimal,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: row.id,
            business_name: row.business_name.unwrap_or_default(),
            comuna: row.comuna.unwrap_or_default(),
            total_units: row
                .total_units
                .and_then(|units| u32::try_from(units).ok())
                .unwrap_or_default(),
            total: row.total,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Repository for order processing.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders in `status`, or all of them, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            "SELECT id, \
                    payload -> 'business' ->> 'business_name' AS business_name, \
                    payload -> 'business' ->> 'comuna' AS comuna, \
                    (payload -> 'totals' ->> 'total_units')::bigint AS total_units, \
                    total, status, created_at \
             FROM tienda.\"order\" \
             WHERE $1::tienda.order_status IS NULL OR status = $1 \
             ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if the stored payload cannot be read.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM tienda.\"order\" WHERE id = $1");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }

    /// Move an order from `from` to `to`.
    ///
    /// The update only applies while the order is still in `from`; if another
    /// admin changed it first nothing is written and `Conflict` is returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist, or
    /// `Conflict` if its status is no longer `from`.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE tienda.\"order\" SET status = $3, updated_at = now() \
             WHERE id = $1 AND status = $2 \
             RETURNING {ORDER_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(self.pool)
            .await?;

        match updated {
            Some(row) => Order::try_from(row),
            None => {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM tienda.\"order\" WHERE id = $1)",
                )
                .bind(id)
                .fetch_one(self.pool)
                .await?;

                if exists {
                    Err(RepositoryError::Conflict(format!(
                        "order {id} is no longer {from}"
                    )))
                } else {
                    Err(RepositoryError::NotFound)
                }
            }
        }
    }

    /// Number of orders awaiting confirmation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_pending(&self) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM tienda.\"order\" WHERE status = 'pending'")
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
