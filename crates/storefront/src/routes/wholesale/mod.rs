//! Wholesale ("Mayorista") portal.
//!
//! Every handler except the pending page requires an approved buyer
//! ([`RequireApprovedBuyer`]). The cart is kept in the session.

pub mod cart;
pub mod checkout;
pub mod orders;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use delicias_core::{Cart, MIN_ORDER_UNITS, PricingError, calculate_totals};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ProfileRepository;
use crate::error::{AppError, pricing_message};
use crate::filters;
use crate::middleware::{RequireApprovedBuyer, RequireBuyer};
use crate::models::{PortalAccess, session_keys};
use crate::state::AppState;
use crate::views::{CartView, ProductView, product_views, tier_headings};

/// Query parameters for error display after a redirect.
#[derive(Debug, Deserialize)]
pub struct ErrorQuery {
    pub error: Option<String>,
}

/// Portal page template: catalog plus cart.
#[derive(Template, WebTemplate)]
#[template(path = "wholesale/portal.html")]
pub struct PortalTemplate {
    pub business_name: String,
    pub products: Vec<ProductView>,
    pub tier_headings: Vec<String>,
    pub cart: CartView,
    pub min_order_units: u32,
    pub error: Option<String>,
}

/// Query parameters for the pending page.
#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub aviso: Option<String>,
}

/// "Awaiting approval" page template.
#[derive(Template, WebTemplate)]
#[template(path = "wholesale/pending.html")]
pub struct PendingTemplate {
    pub business_name: String,
    pub email: String,
    /// `unverified`, `pending` or `rejected`.
    pub reason: &'static str,
    pub notice: Option<&'static str>,
}

/// Text for a pending page notice code.
pub(crate) fn pending_notice(code: &str) -> Option<&'static str> {
    match code {
        "reenviado" => Some("Te enviamos un nuevo enlace de confirmación."),
        "error_correo" => Some("No pudimos enviar el correo, intenta nuevamente en unos minutos."),
        _ => None,
    }
}

// =============================================================================
// Cart session helpers
// =============================================================================

/// Load the cart from the session (empty if none).
pub(crate) async fn load_cart(session: &Session) -> Result<Cart, AppError> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the cart in the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<(), AppError> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Redirect code for a cart error.
pub(crate) const fn pricing_error_code(err: &PricingError) -> &'static str {
    match err {
        PricingError::UnknownProduct(_) => "producto",
        PricingError::QuantityTooLarge { .. } => "cantidad",
        PricingError::Empty => "vacio",
        PricingError::BelowMinimum { .. } => "minimo",
    }
}

/// Text for a redirect code.
pub(crate) fn error_message(code: &str, cart: &Cart) -> String {
    match code {
        "producto" => pricing_message(&PricingError::UnknownProduct(String::new())),
        "cantidad" => pricing_message(&PricingError::QuantityTooLarge {
            quantity: 0,
            max: delicias_core::pricing::MAX_LINE_QUANTITY,
        }),
        "vacio" => pricing_message(&PricingError::Empty),
        "minimo" => pricing_message(&PricingError::BelowMinimum {
            min: MIN_ORDER_UNITS,
            actual: cart.total_units(),
        }),
        _ => "Algo salió mal, intenta nuevamente".to_string(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the portal.
///
/// # Errors
///
/// Returns an error if the session cannot be read or the cart cannot be priced.
#[instrument(skip_all, fields(profile_id = %profile.id))]
pub async fn portal(
    RequireApprovedBuyer(profile): RequireApprovedBuyer,
    session: Session,
    Query(query): Query<ErrorQuery>,
) -> Result<PortalTemplate, AppError> {
    let cart = load_cart(&session).await?;
    let totals = calculate_totals(&cart)?;

    let products = product_views()
        .into_iter()
        .map(|product| ProductView {
            in_cart: cart.quantity_of(product.sku),
            ..product
        })
        .collect();

    Ok(PortalTemplate {
        business_name: profile.business.business_name,
        products,
        tier_headings: tier_headings(),
        cart: CartView::new(&totals),
        min_order_units: MIN_ORDER_UNITS,
        error: query.error.as_deref().map(|code| error_message(code, &cart)),
    })
}

/// Explain why the portal is not available yet.
///
/// Approved buyers are sent on to the portal.
///
/// # Errors
///
/// Returns an error if the profile cannot be loaded.
#[instrument(skip_all, fields(profile_id = %buyer.id))]
pub async fn pending(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, AppError> {
    let profile = ProfileRepository::new(state.pool())
        .get_by_id(buyer.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("profile no longer exists".to_string()))?;

    let reason = match profile.access() {
        PortalAccess::Granted => return Ok(Redirect::to("/mayorista").into_response()),
        PortalAccess::EmailUnverified => "unverified",
        PortalAccess::AwaitingApproval => "pending",
        PortalAccess::Rejected => "rejected",
    };

    Ok(PendingTemplate {
        business_name: profile.business.business_name,
        email: profile.email.to_string(),
        reason,
        notice: query.aviso.as_deref().and_then(pending_notice),
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_round_trip_to_messages() {
        let mut cart = Cart::new();
        cart.add("GAL-MAN-500", 2).ok();

        let code = pricing_error_code(&PricingError::BelowMinimum { min: 6, actual: 2 });
        assert_eq!(code, "minimo");
        assert_eq!(
            error_message(code, &cart),
            "El pedido mínimo es de 6 unidades (llevas 2)"
        );
        assert_eq!(
            error_message("cantidad", &cart),
            "La cantidad máxima por producto es 999"
        );
        assert_eq!(error_message("otro", &cart), "Algo salió mal, intenta nuevamente");
    }

    fn pending_page(reason: &'static str, notice: Option<&'static str>) -> String {
        PendingTemplate {
            business_name: "Panadería Ana".to_string(),
            email: "ana@pan.cl".to_string(),
            reason,
            notice,
        }
        .render()
        .unwrap_or_default()
    }

    #[test]
    fn test_unverified_page_offers_resend() {
        let html = pending_page("unverified", pending_notice("reenviado"));
        assert!(html.contains(r#"action="/auth/verificar/reenviar""#));
        assert!(html.contains("ana@pan.cl"));
        assert!(html.contains("nuevo enlace"));

        let html = pending_page("pending", None);
        assert!(!html.contains("/auth/verificar/reenviar"));
    }

    #[test]
    fn test_pending_notice_codes() {
        assert!(pending_notice("reenviado").is_some());
        assert!(pending_notice("error_correo").is_some_and(|text| text.contains("No pudimos")));
        assert_eq!(pending_notice("<script>"), None);
    }
}
