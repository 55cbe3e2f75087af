//! Cart actions. Each one redirects back to the portal.

use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use delicias_core::{Cart, PricingError};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{load_cart, pricing_error_code, save_cart};
use crate::error::AppError;
use crate::middleware::RequireApprovedBuyer;

/// Add or update form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub sku: String,
    pub quantity: u32,
}

/// Remove form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub sku: String,
}

/// Apply an edit to the session cart and redirect to the portal.
async fn edit_cart(
    session: &Session,
    edit: impl FnOnce(&mut Cart) -> Result<(), PricingError>,
) -> Result<Response, AppError> {
    let mut cart = load_cart(session).await?;
    if let Err(e) = edit(&mut cart) {
        tracing::info!(error = %e, "Cart edit rejected");
        let url = format!("/mayorista?error={}", pricing_error_code(&e));
        return Ok(Redirect::to(&url).into_response());
    }
    save_cart(session, &cart).await?;
    Ok(Redirect::to("/mayorista#carrito").into_response())
}

/// `POST /mayorista/carrito/agregar`
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip_all, fields(sku = %form.sku, quantity = form.quantity))]
pub async fn add(
    _buyer: RequireApprovedBuyer,
    session: Session,
    Form(form): Form<QuantityForm>,
) -> Result<Response, AppError> {
    edit_cart(&session, |cart| cart.add(&form.sku, form.quantity)).await
}

/// `POST /mayorista/carrito/actualizar` (quantity 0 removes the line)
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip_all, fields(sku = %form.sku, quantity = form.quantity))]
pub async fn update(
    _buyer: RequireApprovedBuyer,
    session: Session,
    Form(form): Form<QuantityForm>,
) -> Result<Response, AppError> {
    edit_cart(&session, |cart| cart.set_quantity(&form.sku, form.quantity)).await
}

/// `POST /mayorista/carrito/quitar`
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip_all, fields(sku = %form.sku))]
pub async fn remove(
    _buyer: RequireApprovedBuyer,
    session: Session,
    Form(form): Form<RemoveForm>,
) -> Result<Response, AppError> {
    edit_cart(&session, |cart| {
        cart.remove(&form.sku);
        Ok(())
    })
    .await
}

/// `POST /mayorista/carrito/vaciar`
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip_all)]
pub async fn clear(_buyer: RequireApprovedBuyer, session: Session) -> Result<Response, AppError> {
    edit_cart(&session, |cart| {
        cart.clear();
        Ok(())
    })
    .await
}
