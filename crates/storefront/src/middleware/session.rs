//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions in `tienda.session` using tower-sessions.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "df_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The session id cookie is signed with a key derived from the session secret.
///
/// # Panics
///
/// Does not panic: the schema and table names are valid identifiers.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    // The table is created by the workspace migrations.
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("tienda")
        .expect("valid schema name")
        .with_table_name("session")
        .expect("valid table name");

    SessionManagerLayer::new(store)
        .with_signed(session_key(&config.session_secret))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Cookie signing key: the 64-byte SHA-512 of the configured secret.
fn session_key(secret: &SecretString) -> Key {
    Key::from(Sha512::digest(secret.expose_secret().as_bytes()).as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_follows_secret() {
        let secret = SecretString::from("k8Jq2mXv9LpR4tWz7NcY3bHf6DsGa1Ue");
        let same = SecretString::from("k8Jq2mXv9LpR4tWz7NcY3bHf6DsGa1Ue");
        let other = SecretString::from("Zp4Rw8Lm2Qx7Vb5Nt1Kc9Hy3Gd6Fs0Ja");

        assert_eq!(session_key(&secret).master(), session_key(&same).master());
        assert_ne!(session_key(&secret).master(), session_key(&other).master());
    }
}
