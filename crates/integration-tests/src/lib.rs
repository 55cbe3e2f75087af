//! End-to-end tests for Delicias Florencia.
//!
//! The tests drive both binaries over HTTP and are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start both servers
//! df-cli migrate
//! cargo run -p delicias-storefront &
//! cargo run -p delicias-admin &
//!
//! # Create the admin the tests log in with
//! df-cli admin create -e qa@deliciasflorencia.cl -n QA -r admin -p "$ADMIN_TEST_PASSWORD"
//!
//! cargo test -p delicias-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - default `http://localhost:3001`
//! - `DATABASE_URL` - used to mark test buyers as verified
//! - `ADMIN_TEST_EMAIL` / `ADMIN_TEST_PASSWORD` - an admin-role account

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, Response, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

/// Base URL of the public storefront.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of the back office.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location`.
///
/// Each client claims its own `x-forwarded-for` address so the per-IP login
/// limiters do not trip across tests.
#[must_use]
pub fn client() -> Client {
    let [a, b, c, ..] = *uuid::Uuid::new_v4().as_bytes();
    let mut headers = header::HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        header::HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).expect("valid header"),
    );

    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &Response) -> String {
    assert_eq!(
        resp.status(),
        StatusCode::SEE_OTHER,
        "expected a redirect from {}",
        resp.url()
    );
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect without Location")
        .to_string()
}

/// A unique address so reruns never collide on the email index.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}+{}@example.cl", uuid::Uuid::new_v4().simple())
}

/// Connect to the shared database.
pub async fn pool() -> PgPool {
    let url = SecretString::from(std::env::var("DATABASE_URL").expect("DATABASE_URL not set"));
    PgPool::connect(url.expose_secret())
        .await
        .expect("Failed to connect to database")
}

/// Log a client into the back office with the test admin account.
pub async fn admin_login(client: &Client) {
    let email = std::env::var("ADMIN_TEST_EMAIL").expect("ADMIN_TEST_EMAIL not set");
    let password = SecretString::from(
        std::env::var("ADMIN_TEST_PASSWORD").expect("ADMIN_TEST_PASSWORD not set"),
    );

    let resp = client
        .post(format!("{}/auth/login", admin_url()))
        .form(&[
            ("email", email.as_str()),
            ("password", password.expose_secret()),
        ])
        .send()
        .await
        .expect("Failed to log in to admin");

    assert_eq!(location(&resp), "/", "admin login failed");
}

/// A wholesale buyer created through the registration form.
pub struct TestBuyer {
    pub email: String,
    pub password: String,
    pub business_name: String,
}

impl TestBuyer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            email: unique_email("comprador"),
            password: "masa-madre-2026".to_string(),
            business_name: format!("Cafetería {}", &uuid::Uuid::new_v4().simple().to_string()[..6]),
        }
    }

    /// Submit the registration form.
    pub async fn register(&self, client: &Client) -> Response {
        client
            .post(format!("{}/auth/registro", storefront_url()))
            .form(&[
                ("email", self.email.as_str()),
                ("password", self.password.as_str()),
                ("password_confirm", self.password.as_str()),
                ("business_name", self.business_name.as_str()),
                ("rut", "76.123.456-0"),
                ("contact_name", "Valentina Soto"),
                ("phone", "+56 9 8765 4321"),
                ("address", "O'Higgins 850"),
                ("comuna", "Concepción"),
                ("city", "Concepción"),
            ])
            .send()
            .await
            .expect("Failed to register")
    }

    /// Log in on the storefront, returning the redirect target.
    pub async fn login(&self, client: &Client) -> String {
        let resp = client
            .post(format!("{}/auth/login", storefront_url()))
            .form(&[
                ("email", self.email.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .expect("Failed to log in");
        location(&resp)
    }

    /// Mark the email as verified, standing in for the emailed link.
    pub async fn mark_verified(&self, pool: &PgPool) -> i32 {
        sqlx::query_scalar::<_, i32>(
            "UPDATE tienda.profile SET email_verified = TRUE \
             WHERE lower(email) = lower($1) RETURNING id",
        )
        .bind(&self.email)
        .fetch_one(pool)
        .await
        .expect("Failed to verify test buyer")
    }
}

impl Default for TestBuyer {
    fn default() -> Self {
        Self::new()
    }
}
