//! Pre-formatted view data shared by page templates.
//!
//! Templates only print strings; every peso amount is formatted here.

use chrono::{DateTime, Utc};
use delicias_core::{
    CartTotals, NextTier, OrderStatus, Product, catalog, catalog::tier_thresholds, format_clp,
};
use rust_decimal::Decimal;

use crate::models::{Order, OrderSummary};

/// One tier price of a product.
#[derive(Debug, Clone)]
pub struct TierPriceView {
    pub min_units: u32,
    pub price: String,
}

/// A catalog product with its tier prices.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub sku: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub unit_label: &'static str,
    pub tiers: Vec<TierPriceView>,
    /// Units of this product already in the cart (portal only).
    pub in_cart: u32,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &'static Product) -> Self {
        Self {
            sku: product.sku,
            name: product.name,
            description: product.description,
            unit_label: product.unit_label,
            tiers: product
                .tiers
                .iter()
                .map(|tier| TierPriceView {
                    min_units: tier.min_units,
                    price: format_clp(tier.unit_price()),
                })
                .collect(),
            in_cart: 0,
        }
    }
}

/// Every catalog product, in display order.
#[must_use]
pub fn product_views() -> Vec<ProductView> {
    catalog().iter().map(ProductView::new).collect()
}

/// Column headings for the tier table ("1-11 un.", "12-23 un.", "24+ un.").
#[must_use]
pub fn tier_headings() -> Vec<String> {
    let thresholds = tier_thresholds();
    thresholds
        .iter()
        .enumerate()
        .map(|(i, min)| match thresholds.get(i + 1) {
            Some(next) => format!("{min}-{} un.", next - 1),
            None => format!("{min}+ un."),
        })
        .collect()
}

/// A priced cart line.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub sku: String,
    pub name: String,
    pub unit_label: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// A priced cart, ready to render.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total_units: u32,
    pub tier: usize,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub savings: Option<String>,
    pub next_tier: Option<NextTier>,
    /// Units still missing to reach the minimum order, if any.
    pub units_to_minimum: Option<u32>,
}

impl CartView {
    #[must_use]
    pub fn new(totals: &CartTotals) -> Self {
        Self {
            lines: totals
                .lines
                .iter()
                .map(|line| CartLineView {
                    sku: line.sku.clone(),
                    name: line.name.clone(),
                    unit_label: line.unit_label.clone(),
                    quantity: line.quantity,
                    unit_price: format_clp(line.unit_price),
                    line_total: format_clp(line.line_total),
                })
                .collect(),
            total_units: totals.total_units,
            tier: totals.tier,
            subtotal: format_clp(totals.subtotal),
            tax: format_clp(totals.tax),
            total: format_clp(totals.total),
            savings: (totals.savings > Decimal::ZERO)
                .then(|| format_clp(totals.savings)),
            next_tier: totals.next_tier,
            units_to_minimum: (!totals.meets_minimum())
                .then(|| delicias_core::MIN_ORDER_UNITS - totals.total_units),
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// One order line, pre-formatted.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub unit_label: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// A stored order as shown to the buyer and in the order emails.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub number: String,
    pub status: OrderStatus,
    pub placed_on: String,
    pub business_name: String,
    pub rut: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub delivery_address: String,
    pub lines: Vec<OrderLineView>,
    pub total_units: u32,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub savings: Option<String>,
    pub notes: Option<String>,
    pub detail_url: String,
}

impl OrderView {
    /// Build the view from a stored order.
    #[must_use]
    pub fn new(order: &Order, detail_url: String) -> Self {
        let payload = &order.payload;
        let business = &payload.business;
        let totals = &payload.totals;

        Self {
            number: order.id.to_string(),
            status: order.status,
            placed_on: format_date(order.created_at),
            business_name: business.business_name.clone(),
            rut: business.rut.clone(),
            contact_name: business.contact_name.clone(),
            email: business.email.clone(),
            phone: business.phone.clone(),
            delivery_address: format!(
                "{}, {}, {}",
                business.address, business.comuna, business.city
            ),
            lines: payload
                .lines
                .iter()
                .map(|line| OrderLineView {
                    name: line.name.clone(),
                    unit_label: line.unit_label.clone(),
                    quantity: line.quantity,
                    unit_price: format_clp(line.unit_price),
                    line_total: format_clp(line.line_total),
                })
                .collect(),
            total_units: totals.total_units,
            subtotal: format_clp(totals.subtotal),
            tax: format_clp(totals.tax),
            total: format_clp(totals.total),
            savings: (totals.savings > Decimal::ZERO).then(|| format_clp(totals.savings)),
            notes: order.notes.clone(),
            detail_url,
        }
    }
}

/// One row of the order history.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub placed_on: String,
    pub total_units: u32,
    pub total: String,
    pub status: OrderStatus,
}

impl From<&OrderSummary> for OrderRowView {
    fn from(summary: &OrderSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            placed_on: format_date(summary.created_at),
            total_units: summary.total_units,
            total: format_clp(summary.total),
            status: summary.status,
        }
    }
}

/// `dd-mm-yyyy HH:MM` in UTC.
fn format_date(at: DateTime<Utc>) -> String {
    at.format("%d-%m-%Y %H:%M").to_string()
}
