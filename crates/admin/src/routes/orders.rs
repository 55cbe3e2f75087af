//! Wholesale order processing.
//!
//! Orders move pending → confirmed → delivered, or to cancelled from either
//! open state. Each change emails the buyer.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use delicias_core::{OrderId, OrderStatus};
use serde::Deserialize;
use tracing::instrument;

use crate::db::{OrderRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::state::AppState;
use crate::views::{AdminUserView, FilterTab, OrderRowView, OrderView, order_tabs};

use super::{ListQuery, notice_message, render};

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub estado: String,
}

/// Order list template.
#[derive(Template)]
#[template(path = "pedidos/index.html")]
pub struct OrdersTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub tabs: Vec<FilterTab>,
    pub orders: Vec<OrderRowView>,
}

/// Order detail template.
#[derive(Template)]
#[template(path = "pedidos/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub order: OrderView,
    pub notice: Option<String>,
    pub error_message: Option<String>,
}

fn parse_status(value: &str) -> Result<OrderStatus, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Estado desconocido: {value}")))
}

fn detail_redirect(id: OrderId, query: &str) -> Response {
    Redirect::to(&format!("/pedidos/{id}?{query}")).into_response()
}

/// List orders, newest first, optionally filtered by status.
///
/// GET /pedidos
///
/// # Errors
///
/// Returns an error for an unknown status or if the query fails.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let status = query
        .estado
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_status)
        .transpose()?;
    let orders = OrderRepository::new(state.pool()).list(status).await?;

    Ok(render(&OrdersTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/pedidos".to_string(),
        tabs: order_tabs(status),
        orders: orders.iter().map(OrderRowView::from).collect(),
    }))
}

/// Show one order from its stored payload.
///
/// GET /pedidos/{id}
///
/// # Errors
///
/// Returns 404 if the order does not exist.
#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let order = OrderRepository::new(state.pool())
        .get_by_id(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(render(&OrderShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/pedidos".to_string(),
        order: OrderView::from(&order),
        notice: query.aviso.as_deref().map(notice_message),
        error_message: query.error.as_deref().map(notice_message),
    }))
}

/// Move an order to a new status and email the buyer.
///
/// The state machine is checked first, then the update only applies if
/// nobody changed the order in between.
///
/// POST /pedidos/{id}/estado
///
/// # Errors
///
/// Returns 404 if the order does not exist or 400 for an unknown status.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id, to = %form.estado))]
pub async fn update_status(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let repo = OrderRepository::new(state.pool());
    let id = OrderId::new(id);
    let to = parse_status(&form.estado)?;

    let order = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    if let Err(e) = order.status.transition(to) {
        tracing::info!(order_id = %id, error = %e, "Status change refused");
        return Ok(detail_redirect(id, "error=transicion"));
    }

    let updated = match repo.update_status(id, order.status, to).await {
        Ok(updated) => updated,
        Err(RepositoryError::Conflict(reason)) => {
            tracing::info!(order_id = %id, %reason, "Order changed concurrently");
            return Ok(detail_redirect(id, "error=conflicto"));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(order_id = %id, from = %order.status, to = %updated.status, "Order status changed");

    let view = OrderView::from(&updated);
    let link = state
        .config()
        .storefront_url(&format!("/mayorista/pedidos/{id}"));
    if let Err(e) = state.email().send_order_status(&view, &link).await {
        tracing::error!(order_id = %id, error = %e, "Failed to send order status email");
        return Ok(detail_redirect(id, "error=correo"));
    }

    Ok(detail_redirect(id, "aviso=estado"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::views::tests::order;

    #[test]
    fn test_parse_status_labels() {
        assert_eq!(parse_status("confirmed").unwrap(), OrderStatus::Confirmed);
        assert_eq!(parse_status(" cancelled ").unwrap(), OrderStatus::Cancelled);
        assert!(matches!(
            parse_status("shipped"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_show_page_offers_only_allowed_transitions() {
        let template = OrderShowTemplate {
            admin_user: AdminUserView {
                name: "Marta".to_string(),
                email: "marta@deliciasflorencia.cl".to_string(),
                role: delicias_core::AdminRole::Admin,
                is_super_admin: false,
                can_write: true,
            },
            current_path: "/pedidos".to_string(),
            order: OrderView::from(&order(OrderStatus::Confirmed)),
            notice: None,
            error_message: None,
        };
        let html = template.render().unwrap();

        assert!(html.contains(r#"value="delivered""#));
        assert!(html.contains(r#"value="cancelled""#));
        assert!(!html.contains(r#"value="pending""#));
        assert!(html.contains("ALF-MAI-12"));
    }

    #[test]
    fn test_viewer_sees_no_status_buttons() {
        let template = OrderShowTemplate {
            admin_user: AdminUserView {
                name: "Lectura".to_string(),
                email: "lectura@deliciasflorencia.cl".to_string(),
                role: delicias_core::AdminRole::Viewer,
                is_super_admin: false,
                can_write: false,
            },
            current_path: "/pedidos".to_string(),
            order: OrderView::from(&order(OrderStatus::Pending)),
            notice: None,
            error_message: None,
        };
        let html = template.render().unwrap();
        assert!(!html.contains(r#"name="estado""#));
    }
}
