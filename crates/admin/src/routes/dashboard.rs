//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Response};
use delicias_core::OrderStatus;
use tracing::instrument;

use crate::{
    db::{OrderRepository, ProfileRepository, SocioRepository},
    filters,
    middleware::RequireAdminAuth,
    state::AppState,
    views::{AdminUserView, OrderRowView},
};

use super::render;

/// How many waiting orders the dashboard lists.
const RECENT_ORDERS: usize = 5;

/// Work waiting for the team.
#[derive(Debug, Clone, Default)]
pub struct DashboardMetrics {
    pub pending_profiles: i64,
    pub approved_profiles: i64,
    pub pending_socios: i64,
    pub pending_orders: i64,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<OrderRowView>,
    /// Set when one of the counts could not be loaded.
    pub error_message: Option<String>,
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip(admin, state))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Response {
    let profiles = ProfileRepository::new(state.pool());
    let socios = SocioRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());

    let (profile_counts, pending_socios, pending_orders, waiting) = tokio::join!(
        profiles.count_by_status(),
        socios.count_pending(),
        orders.count_pending(),
        orders.list(Some(OrderStatus::Pending)),
    );

    let mut error_message = None;
    let mut metrics = DashboardMetrics::default();

    match profile_counts {
        Ok(counts) => {
            metrics.pending_profiles = counts.pending;
            metrics.approved_profiles = counts.approved;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to count profiles");
            error_message = Some("No pudimos cargar las cuentas".to_string());
        }
    }

    match pending_socios {
        Ok(count) => metrics.pending_socios = count,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count socios");
            error_message.get_or_insert_with(|| "No pudimos cargar los socios".to_string());
        }
    }

    match pending_orders {
        Ok(count) => metrics.pending_orders = count,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count orders");
            error_message.get_or_insert_with(|| "No pudimos cargar los pedidos".to_string());
        }
    }

    let recent_orders = match waiting {
        Ok(orders) => orders
            .iter()
            .take(RECENT_ORDERS)
            .map(OrderRowView::from)
            .collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load pending orders");
            error_message.get_or_insert_with(|| "No pudimos cargar los pedidos".to_string());
            Vec::new()
        }
    };

    render(&DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        metrics,
        recent_orders,
        error_message,
    })
}
