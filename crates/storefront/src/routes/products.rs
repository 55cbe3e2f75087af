//! Public catalog route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use delicias_core::MIN_ORDER_UNITS;
use tracing::instrument;

use crate::filters;
use crate::views::{ProductView, product_views, tier_headings};

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub tier_headings: Vec<String>,
    pub min_order_units: u32,
}

/// Display the catalog with every tier price.
///
/// Prices are public; ordering requires an approved wholesale account.
#[instrument]
pub async fn index() -> impl IntoResponse {
    ProductsIndexTemplate {
        products: product_views(),
        tier_headings: tier_headings(),
        min_order_units: MIN_ORDER_UNITS,
    }
}
