//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//! GET  /health/ready                 - Readiness (database)
//!
//! # Auth
//! GET  /auth/login                   - Login page
//! POST /auth/login                   - Login action (rate limited)
//! POST /auth/logout                  - Logout
//!
//! # Dashboard
//! GET  /                             - Pending counts
//!
//! # Buyer accounts
//! GET  /usuarios                     - Profiles by status (?estado=)
//! POST /usuarios/{id}/aprobar        - Approve, email buyer
//! POST /usuarios/{id}/rechazar       - Reject, email buyer
//!
//! # Socios
//! GET  /socios                       - Listings by status (?estado=)
//! GET  /socios/nuevo                 - New listing form
//! POST /socios                       - Create listing
//! GET  /socios/{id}/editar           - Edit form
//! POST /socios/{id}                  - Update listing
//! POST /socios/{id}/aprobar          - Approve
//! POST /socios/{id}/rechazar         - Reject (also hides it)
//! POST /socios/{id}/visibilidad      - Show on / hide from the map
//! POST /socios/{id}/geocodificar     - Resolve address to coordinates
//! POST /socios/{id}/eliminar         - Delete
//!
//! # Orders
//! GET  /pedidos                      - Orders by status (?estado=)
//! GET  /pedidos/{id}                 - Order detail
//! POST /pedidos/{id}/estado          - Change status, email buyer
//! ```
//!
//! Every POST except login requires a role that can write.

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod profiles;
pub mod socios;

use askama::Template;
use axum::{
    Router,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Status filter and one-shot messages carried in the query string.
///
/// Actions redirect back to their list with `aviso` (success) or `error`
/// set to a short code; [`notice_message`] turns it into text.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub estado: Option<String>,
    pub aviso: Option<String>,
    pub error: Option<String>,
}

/// Map a notice code to the text shown above a list.
#[must_use]
pub fn notice_message(code: &str) -> String {
    match code {
        "aprobado" => "Cuenta aprobada. Le enviamos un correo al comprador.",
        "rechazado" => "Cuenta rechazada. Le enviamos un correo al comprador.",
        "correo" => "El cambio se guardó, pero no pudimos enviar el correo.",
        "socio_creado" => "Socio creado.",
        "socio_guardado" => "Socio actualizado.",
        "socio_aprobado" => "Socio aprobado.",
        "socio_rechazado" => "Socio rechazado y oculto del mapa.",
        "socio_visible" => "El socio ahora aparece en el mapa.",
        "socio_oculto" => "El socio ya no aparece en el mapa.",
        "socio_ubicado" => "Dirección ubicada en el mapa.",
        "socio_eliminado" => "Socio eliminado.",
        "sin_direccion" => "No encontramos esa dirección; revisa la dirección y la comuna.",
        "mapa" => "El servicio de mapas no respondió. Intenta más tarde.",
        "estado" => "Estado actualizado.",
        "conflicto" => "Otra persona cambió este registro. Revisa el estado actual.",
        "transicion" => "Ese cambio de estado no está permitido.",
        _ => "Algo salió mal, intenta nuevamente.",
    }
    .to_string()
}

/// Render a page, logging template failures.
pub(crate) fn render(template: &impl Template) -> Response {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
    .into_response()
}

/// Create the auth routes router.
///
/// Only the login form submission is rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route("/logout", post(auth::logout))
        .merge(
            Router::new()
                .route("/login", post(auth::login))
                .route_layer(login_rate_limiter()),
        )
}

/// Create the buyer account review router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profiles::index))
        .route("/{id}/aprobar", post(profiles::approve))
        .route("/{id}/rechazar", post(profiles::reject))
}

/// Create the socio management router.
pub fn socio_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(socios::index).post(socios::create))
        .route("/nuevo", get(socios::new_page))
        .route("/{id}", post(socios::update))
        .route("/{id}/editar", get(socios::edit_page))
        .route("/{id}/aprobar", post(socios::approve))
        .route("/{id}/rechazar", post(socios::reject))
        .route("/{id}/visibilidad", post(socios::toggle_visibility))
        .route("/{id}/geocodificar", post(socios::geocode))
        .route("/{id}/eliminar", post(socios::delete))
}

/// Create the order processing router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/estado", post(orders::update_status))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .nest("/auth", auth_routes())
        .nest("/usuarios", profile_routes())
        .nest("/socios", socio_routes())
        .nest("/pedidos", order_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_codes_have_text() {
        assert!(notice_message("aprobado").contains("aprobada"));
        assert!(notice_message("socio_rechazado").contains("oculto"));
        assert_eq!(
            notice_message("no-existe"),
            "Algo salió mal, intenta nuevamente."
        );
    }
}
