//! Buyer order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use delicias_core::OrderId;
use serde::Deserialize;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireApprovedBuyer;
use crate::state::AppState;
use crate::views::{OrderRowView, OrderView};

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "wholesale/orders.html")]
pub struct OrdersTemplate {
    pub orders: Vec<OrderRowView>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "wholesale/order_detail.html")]
pub struct OrderDetailTemplate {
    pub order: OrderView,
    /// Set right after checkout.
    pub just_placed: bool,
}

/// Query flag set by the checkout redirect.
#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub nuevo: Option<u8>,
}

/// List the buyer's orders, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
#[instrument(skip_all, fields(profile_id = %profile.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireApprovedBuyer(profile): RequireApprovedBuyer,
) -> Result<OrdersTemplate, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_profile(profile.id)
        .await?;

    Ok(OrdersTemplate {
        orders: orders.iter().map(OrderRowView::from).collect(),
    })
}

/// Show one of the buyer's orders.
///
/// Orders of other buyers answer 404, same as missing ones.
///
/// # Errors
///
/// Returns 404 for unknown or foreign orders.
#[instrument(skip_all, fields(profile_id = %profile.id, order_id = id))]
pub async fn show(
    State(state): State<AppState>,
    RequireApprovedBuyer(profile): RequireApprovedBuyer,
    Path(id): Path<i32>,
    Query(query): Query<DetailQuery>,
) -> Result<OrderDetailTemplate, AppError> {
    let order = OrderRepository::new(state.pool())
        .get_for_profile(OrderId::new(id), profile.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let detail_url = state.config().url(&format!("/mayorista/pedidos/{id}"));
    Ok(OrderDetailTemplate {
        order: OrderView::new(&order, detail_url),
        just_placed: query.nuevo.is_some(),
    })
}
