//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                             - Home page
//! GET  /productos                    - Catalog with tier prices
//! GET  /paginas/{slug}               - Markdown content page
//!
//! # Distributors
//! GET  /distribuidores               - Map page
//! GET  /api/distribuidores           - Public socios (JSON)
//! GET  /api/distribuidores/cercanos  - Nearest socios (JSON, ?lat=&lng=&limit=)
//! GET  /socios/postular              - Partner application form
//! POST /socios/postular              - Submit application
//!
//! # Auth
//! GET  /auth/registro                - Register page
//! POST /auth/registro                - Register action
//! GET  /auth/verificar               - Verify email (?token=)
//! POST /auth/verificar/reenviar      - Resend verification link
//! GET  /auth/login                   - Login page
//! POST /auth/login                   - Login action
//! POST /auth/logout                  - Logout action
//! GET  /auth/recuperar               - Forgot password page
//! POST /auth/recuperar               - Send reset link
//! GET  /auth/restablecer             - Reset password page (?token=)
//! POST /auth/restablecer             - Set new password
//!
//! # Wholesale portal (approved buyers)
//! GET  /mayorista                    - Catalog + cart
//! POST /mayorista/carrito/agregar    - Add to cart
//! POST /mayorista/carrito/actualizar - Set quantity
//! POST /mayorista/carrito/quitar     - Remove line
//! POST /mayorista/carrito/vaciar     - Empty cart
//! GET  /mayorista/checkout           - Review order
//! POST /mayorista/checkout           - Place order
//! GET  /mayorista/pedidos            - Order history
//! GET  /mayorista/pedidos/{id}       - Order detail
//! GET  /mayorista/pendiente          - Awaiting approval (any logged-in buyer)
//! ```

pub mod auth;
pub mod distributors;
pub mod home;
pub mod pages;
pub mod partners;
pub mod products;
pub mod wholesale;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Form submissions are rate limited; the pages are not.
pub fn auth_routes() -> Router<AppState> {
    let pages = Router::new()
        .route("/registro", get(auth::register_page))
        .route("/verificar", get(auth::verify_email))
        .route("/login", get(auth::login_page))
        .route("/recuperar", get(auth::forgot_password_page))
        .route("/restablecer", get(auth::reset_password_page));

    let actions = Router::new()
        .route("/registro", post(auth::register))
        .route("/verificar/reenviar", post(auth::resend_verification))
        .route("/login", post(auth::login))
        .route("/recuperar", post(auth::forgot_password))
        .route("/restablecer", post(auth::reset_password))
        .route_layer(auth_rate_limiter());

    pages
        .merge(actions)
        .route("/logout", post(auth::logout))
}

/// Create the distributor JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/distribuidores", get(distributors::list))
        .route("/distribuidores/cercanos", get(distributors::nearby))
        .route_layer(api_rate_limiter())
}

/// Create the partner application router.
pub fn partner_routes() -> Router<AppState> {
    Router::new()
        .route("/postular", get(partners::apply_page))
        .merge(
            Router::new()
                .route("/postular", post(partners::apply))
                .route_layer(form_rate_limiter()),
        )
}

/// Create the wholesale portal router.
pub fn wholesale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wholesale::portal))
        .route("/pendiente", get(wholesale::pending))
        .route("/carrito/agregar", post(wholesale::cart::add))
        .route("/carrito/actualizar", post(wholesale::cart::update))
        .route("/carrito/quitar", post(wholesale::cart::remove))
        .route("/carrito/vaciar", post(wholesale::cart::clear))
        .route(
            "/checkout",
            get(wholesale::checkout::review).post(wholesale::checkout::place_order),
        )
        .route("/pedidos", get(wholesale::orders::index))
        .route("/pedidos/{id}", get(wholesale::orders::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/productos", get(products::index))
        .route("/distribuidores", get(distributors::index))
        .route("/paginas/{slug}", get(pages::show))
        .nest("/socios", partner_routes())
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
        .nest("/mayorista", wholesale_routes())
}
