//! Checkout: review the priced cart and place the order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use delicias_core::{BusinessSnapshot, OrderPayload, calculate_totals, validate_for_checkout};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{ErrorQuery, error_message, load_cart, pricing_error_code, save_cart};
use crate::db::OrderRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireApprovedBuyer;
use crate::state::AppState;
use crate::views::{CartView, OrderView};

/// Longest buyer note kept with an order.
const MAX_NOTES_LENGTH: usize = 1000;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub notes: String,
}

/// Checkout review template.
#[derive(Template, WebTemplate)]
#[template(path = "wholesale/checkout.html")]
pub struct CheckoutTemplate {
    pub business: BusinessSnapshot,
    pub cart: CartView,
    pub error: Option<String>,
}

/// Display the checkout review.
///
/// An empty cart goes back to the portal.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
#[instrument(skip_all, fields(profile_id = %profile.id))]
pub async fn review(
    RequireApprovedBuyer(profile): RequireApprovedBuyer,
    session: Session,
    Query(query): Query<ErrorQuery>,
) -> Result<Response, AppError> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/mayorista?error=vacio").into_response());
    }
    let totals = calculate_totals(&cart)?;

    Ok(CheckoutTemplate {
        business: profile.snapshot(),
        cart: CartView::new(&totals),
        error: query.error.as_deref().map(|code| error_message(code, &cart)),
    }
    .into_response())
}

/// Place the order.
///
/// Snapshots the buyer and cart into a pending order, empties the cart and
/// sends the confirmation emails. A failed email does not fail the order.
///
/// # Errors
///
/// Returns an error if the order cannot be stored or the session fails.
#[instrument(skip_all, fields(profile_id = %profile.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireApprovedBuyer(profile): RequireApprovedBuyer,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let mut cart = load_cart(&session).await?;
    let totals = match validate_for_checkout(&cart) {
        Ok(totals) => totals,
        Err(e) => {
            tracing::info!(error = %e, "Checkout rejected");
            let url = format!("/mayorista/checkout?error={}", pricing_error_code(&e));
            return Ok(Redirect::to(&url).into_response());
        }
    };

    let notes = clean_notes(&form.notes);
    let payload = OrderPayload::new(profile.snapshot(), totals);
    let order = OrderRepository::new(state.pool())
        .create(profile.id, &payload, notes.as_deref())
        .await?;

    tracing::info!(
        order_id = %order.id,
        total = %order.total,
        units = payload.totals.total_units,
        "Order placed"
    );

    cart.clear();
    save_cart(&session, &cart).await?;

    let detail_path = format!("/mayorista/pedidos/{}", order.id);
    let view = OrderView::new(&order, state.config().url(&detail_path));
    if let Err(e) = state
        .email()
        .send_order_confirmation(profile.email.as_str(), &view)
        .await
    {
        tracing::error!(error = %e, order_id = %order.id, "Failed to send order confirmation");
    }
    if let Err(e) = state.email().notify_new_order(&view).await {
        tracing::error!(error = %e, order_id = %order.id, "Failed to notify new order");
    }

    Ok(Redirect::to(&format!("{detail_path}?nuevo=1")).into_response())
}

/// Trim notes, drop empty ones and cap the length.
fn clean_notes(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.chars().take(MAX_NOTES_LENGTH).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_notes() {
        assert_eq!(clean_notes("   "), None);
        assert_eq!(
            clean_notes("  Portón verde \n").as_deref(),
            Some("Portón verde")
        );
        assert_eq!(
            clean_notes(&"ñ".repeat(MAX_NOTES_LENGTH + 50))
                .map(|n| n.chars().count()),
            Some(MAX_NOTES_LENGTH)
        );
    }
}
