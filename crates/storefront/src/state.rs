//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::content::ContentStore;
use crate::db::{RepositoryError, SocioRepository};
use crate::models::Socio;
use crate::services::EmailService;

/// How long the public distributor list is served from memory.
const SOCIO_CACHE_TTL: Duration = Duration::from_secs(300);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    email: EmailService,
    content: ContentStore,
    public_socios: Cache<(), Arc<Vec<Socio>>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        pool: PgPool,
        email: EmailService,
        content: ContentStore,
    ) -> Self {
        let public_socios = Cache::builder()
            .max_capacity(1)
            .time_to_live(SOCIO_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                content,
                public_socios,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Get a reference to the content pages.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Socios shown on the public map, read through a short-lived cache.
    ///
    /// Admin changes become visible once the cache entry expires.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the list has to be loaded and the query fails.
    pub async fn public_socios(&self) -> Result<Arc<Vec<Socio>>, RepositoryError> {
        if let Some(socios) = self.inner.public_socios.get(&()).await {
            return Ok(socios);
        }

        let socios = Arc::new(SocioRepository::new(self.pool()).list_public().await?);
        self.inner.public_socios.insert((), Arc::clone(&socios)).await;
        Ok(socios)
    }
}
