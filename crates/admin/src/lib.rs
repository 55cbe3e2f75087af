//! Delicias Florencia admin library.
//!
//! The back office: buyer account approval, distributor listings and order
//! processing. Built as a library so the router can be exercised in tests;
//! the `delicias-admin` binary only loads config and serves [`app`].
//!
//! # Security
//!
//! Staff-only. Sessions use a `SameSite=Strict` cookie, the login form is
//! rate limited and `viewer` accounts cannot change anything.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod views;

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::from_fn,
    response::Response,
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Directory served under `/static`, relative to the working directory.
pub const STATIC_DIR: &str = "crates/admin/static";

/// Build the complete admin router.
///
/// Layers, outermost first: Sentry, request span, request ID, security
/// headers, session.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                        request_id = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Method;
    use axum::http::header::{CACHE_CONTROL, CONTENT_SECURITY_POLICY, LOCATION};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::test_config;
    use crate::services::{EmailService, Geocoder};

    fn test_app() -> Router {
        let config = test_config();
        // Never connects unless a handler touches the database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/delicias_test")
            .unwrap();
        let email = EmailService::new(&config.email).unwrap();
        let geocoder = Geocoder::new(&config.geocoder).unwrap();

        app(AppState::new(config, pool, email, geocoder))
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "10.0.0.7")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_has_security_and_request_id_headers() {
        let response = test_app()
            .oneshot(request(Method::GET, "/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(CONTENT_SECURITY_POLICY));
        assert!(response.headers().contains_key(CACHE_CONTROL));
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_login_page_is_public() {
        let response = test_app()
            .oneshot(request(Method::GET, "/auth/login"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(r#"name="password""#));
    }

    #[tokio::test]
    async fn test_pages_redirect_anonymous_to_login() {
        for uri in ["/", "/usuarios", "/socios", "/socios/nuevo", "/pedidos", "/pedidos/7"] {
            let response = test_app()
                .oneshot(request(Method::GET, uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers()[LOCATION], "/auth/login", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_actions_redirect_anonymous_to_login() {
        for uri in [
            "/usuarios/3/aprobar",
            "/socios/5/geocodificar",
            "/socios/5/eliminar",
            "/pedidos/7/estado",
        ] {
            let response = test_app()
                .oneshot(request(Method::POST, uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers()[LOCATION], "/auth/login", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(request(Method::GET, "/productos"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
