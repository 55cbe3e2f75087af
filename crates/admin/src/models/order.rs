//! Wholesale orders as seen by the bakery.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use delicias_core::{OrderId, OrderPayload, OrderStatus, ProfileId};

/// A stored order with its frozen payload.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub profile_id: ProfileId,
    pub payload: OrderPayload,
    pub total: Decimal,
    pub status: OrderStatus,
    /// Notes entered by the buyer at checkout.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the order list.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub id: OrderId,
    pub business_name: String,
    pub comuna: String,
    pub total_units: u32,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
