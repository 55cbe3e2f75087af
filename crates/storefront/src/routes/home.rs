//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use delicias_core::MIN_ORDER_UNITS;
use tracing::instrument;

use crate::filters;
use crate::views::{ProductView, product_views, tier_headings};

/// Products featured on the home page.
const FEATURED_COUNT: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub featured: Vec<ProductView>,
    pub tier_headings: Vec<String>,
    pub min_order_units: u32,
}

/// Display the home page.
#[instrument]
pub async fn home() -> impl IntoResponse {
    let mut featured = product_views();
    featured.truncate(FEATURED_COUNT);

    HomeTemplate {
        featured,
        tier_headings: tier_headings(),
        min_order_units: MIN_ORDER_UNITS,
    }
}
