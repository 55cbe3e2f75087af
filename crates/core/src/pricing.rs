//! Wholesale cart and tiered pricing.
//!
//! Tiers are chosen by the **total** number of units in the cart, so mixing
//! products still counts towards the volume discount. All amounts are net
//! Chilean pesos; IVA is added on top of the subtotal.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Product, find_product, tier_thresholds};

/// Smallest order the bakery accepts, in units across all products.
pub const MIN_ORDER_UNITS: u32 = 6;

/// Largest quantity accepted for a single line.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// IVA rate applied to the net subtotal (19%).
pub const TAX_RATE_PERCENT: i64 = 19;

/// Errors raised while editing or pricing a cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The SKU is not in the catalog.
    #[error("unknown product: {0}")]
    UnknownProduct(String),
    /// A line quantity exceeds [`MAX_LINE_QUANTITY`].
    #[error("quantity {quantity} exceeds the maximum of {max} per product")]
    QuantityTooLarge {
        /// Requested quantity.
        quantity: u32,
        /// Allowed maximum.
        max: u32,
    },
    /// The cart has no lines.
    #[error("the cart is empty")]
    Empty,
    /// The cart is below the minimum order size.
    #[error("minimum order is {min} units, cart has {actual}")]
    BelowMinimum {
        /// Required units.
        min: u32,
        /// Units in the cart.
        actual: u32,
    },
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product SKU.
    pub sku: String,
    /// Number of units, always greater than zero.
    pub quantity: u32,
}

/// A wholesale cart, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown SKUs or if the line would exceed
    /// [`MAX_LINE_QUANTITY`]. Adding zero units is a no-op.
    pub fn add(&mut self, sku: &str, quantity: u32) -> Result<(), PricingError> {
        let current = self.quantity_of(sku);
        self.set_quantity(sku, current.saturating_add(quantity))
    }

    /// Set the quantity of a product; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown SKUs or quantities above
    /// [`MAX_LINE_QUANTITY`].
    pub fn set_quantity(&mut self, sku: &str, quantity: u32) -> Result<(), PricingError> {
        lookup(sku)?;
        if quantity > MAX_LINE_QUANTITY {
            return Err(PricingError::QuantityTooLarge {
                quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        if quantity == 0 {
            self.remove(sku);
            return Ok(());
        }

        match self.lines.iter_mut().find(|line| line.sku == sku) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine {
                sku: sku.to_owned(),
                quantity,
            }),
        }
        Ok(())
    }

    /// Remove a product from the cart. Returns whether a line was removed.
    pub fn remove(&mut self, sku: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.sku != sku);
        self.lines.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Quantity currently held for `sku`.
    #[must_use]
    pub fn quantity_of(&self, sku: &str) -> u32 {
        self.lines
            .iter()
            .find(|line| line.sku == sku)
            .map_or(0, |line| line.quantity)
    }

    /// Units across all lines.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }
}

/// A cart line with its resolved price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    /// Product SKU.
    pub sku: String,
    /// Product name at the time of pricing.
    pub name: String,
    /// Unit description (e.g. "caja 12 un.").
    pub unit_label: String,
    /// Units ordered.
    pub quantity: u32,
    /// Net unit price for the cart's tier.
    pub unit_price: Decimal,
    /// `quantity * unit_price`.
    pub line_total: Decimal,
    /// Net unit price at the first tier.
    pub base_unit_price: Decimal,
}

/// How far the cart is from the next volume tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextTier {
    /// 1-based number of the next tier.
    pub tier: usize,
    /// Units at which it starts.
    pub min_units: u32,
    /// Units still missing.
    pub units_needed: u32,
}

/// Result of pricing a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Priced lines in cart order.
    pub lines: Vec<PricedLine>,
    /// Units across all lines.
    pub total_units: u32,
    /// 1-based tier reached by the cart.
    pub tier: usize,
    /// Net subtotal.
    pub subtotal: Decimal,
    /// IVA on the subtotal, rounded to whole pesos.
    pub tax: Decimal,
    /// `subtotal + tax`.
    pub total: Decimal,
    /// Net discount compared with first-tier prices.
    pub savings: Decimal,
    /// Next tier, if the cart has not reached the last one.
    pub next_tier: Option<NextTier>,
}

impl CartTotals {
    /// Whether the order meets [`MIN_ORDER_UNITS`].
    #[must_use]
    pub const fn meets_minimum(&self) -> bool {
        self.total_units >= MIN_ORDER_UNITS
    }
}

fn lookup(sku: &str) -> Result<&'static Product, PricingError> {
    find_product(sku).ok_or_else(|| PricingError::UnknownProduct(sku.to_owned()))
}

/// 1-based tier for a unit count and the following break, if any.
fn tier_position(units: u32) -> (usize, Option<NextTier>) {
    let thresholds = tier_thresholds();
    let reached = thresholds.iter().filter(|min| **min <= units).count().max(1);
    let next = thresholds.get(reached).map(|min_units| NextTier {
        tier: reached + 1,
        min_units: *min_units,
        units_needed: min_units.saturating_sub(units),
    });
    (reached, next)
}

/// Units still needed for the cart to reach the next volume tier.
///
/// Returns `None` once the last tier is reached.
#[must_use]
pub fn next_tier_hint(cart: &Cart) -> Option<NextTier> {
    tier_position(cart.total_units()).1
}

/// Price every line of the cart at the tier reached by its total volume.
///
/// An empty cart prices to zero.
///
/// # Errors
///
/// Returns [`PricingError::UnknownProduct`] if a line references a SKU that
/// is no longer in the catalog.
pub fn calculate_totals(cart: &Cart) -> Result<CartTotals, PricingError> {
    let total_units = cart.total_units();
    let mut lines = Vec::with_capacity(cart.lines().len());
    let mut subtotal = Decimal::ZERO;
    let mut base_subtotal = Decimal::ZERO;

    for line in cart.lines() {
        let product = lookup(&line.sku)?;
        let quantity = Decimal::from(line.quantity);
        let unit_price = product.unit_price_for(total_units);
        let base_unit_price = product.base_price();
        let line_total = unit_price * quantity;

        subtotal += line_total;
        base_subtotal += base_unit_price * quantity;
        lines.push(PricedLine {
            sku: product.sku.to_owned(),
            name: product.name.to_owned(),
            unit_label: product.unit_label.to_owned(),
            quantity: line.quantity,
            unit_price,
            line_total,
            base_unit_price,
        });
    }

    let tax = (subtotal * Decimal::new(TAX_RATE_PERCENT, 2))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let (tier, next_tier) = tier_position(total_units);

    Ok(CartTotals {
        lines,
        total_units,
        tier,
        subtotal,
        tax,
        total: subtotal + tax,
        savings: base_subtotal - subtotal,
        next_tier,
    })
}

/// Price a cart and check it can be submitted as an order.
///
/// # Errors
///
/// Returns [`PricingError::Empty`] or [`PricingError::BelowMinimum`] when the
/// cart cannot be ordered, or any error from [`calculate_totals`].
pub fn validate_for_checkout(cart: &Cart) -> Result<CartTotals, PricingError> {
    if cart.is_empty() {
        return Err(PricingError::Empty);
    }
    let totals = calculate_totals(cart)?;
    if !totals.meets_minimum() {
        return Err(PricingError::BelowMinimum {
            min: MIN_ORDER_UNITS,
            actual: totals.total_units,
        });
    }
    Ok(totals)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart_with(lines: &[(&str, u32)]) -> Cart {
        let mut cart = Cart::new();
        for (sku, qty) in lines {
            cart.add(sku, *qty).unwrap();
        }
        cart
    }

    #[test]
    fn test_six_units_use_tier_one_rate() {
        let totals = calculate_totals(&cart_with(&[("ALF-MAI-12", 6)])).unwrap();
        assert_eq!(totals.tier, 1);
        assert_eq!(totals.lines[0].unit_price, Decimal::from(6_490));
        assert_eq!(totals.subtotal, Decimal::from(38_940));
        assert_eq!(totals.savings, Decimal::ZERO);
    }

    #[test]
    fn test_twelve_units_use_tier_two_rate() {
        let totals = calculate_totals(&cart_with(&[("ALF-MAI-12", 12)])).unwrap();
        assert_eq!(totals.tier, 2);
        assert_eq!(totals.lines[0].unit_price, Decimal::from(5_990));
        assert_eq!(totals.subtotal, Decimal::from(71_880));
        assert_eq!(totals.savings, Decimal::from(6_000));
    }

    #[test]
    fn test_tier_counts_units_across_products() {
        let totals =
            calculate_totals(&cart_with(&[("ALF-MAI-12", 8), ("GAL-MAN-500", 4)])).unwrap();
        assert_eq!(totals.total_units, 12);
        assert_eq!(totals.tier, 2);
        assert_eq!(totals.lines[1].unit_price, Decimal::from(4_590));
    }

    #[test]
    fn test_tax_and_total() {
        // 6 x 4.990 = 29.940 net; IVA 19% = 5.688,6 -> 5.689
        let totals = calculate_totals(&cart_with(&[("GAL-MAN-500", 6)])).unwrap();
        assert_eq!(totals.subtotal, Decimal::from(29_940));
        assert_eq!(totals.tax, Decimal::from(5_689));
        assert_eq!(totals.total, Decimal::from(35_629));
    }

    #[test]
    fn test_next_tier_hint() {
        let totals = calculate_totals(&cart_with(&[("BRO-NUE-9", 10)])).unwrap();
        assert_eq!(
            totals.next_tier,
            Some(NextTier {
                tier: 2,
                min_units: 12,
                units_needed: 2
            })
        );

        let top = calculate_totals(&cart_with(&[("BRO-NUE-9", 30)])).unwrap();
        assert_eq!(top.tier, 3);
        assert_eq!(top.next_tier, None);
    }

    #[test]
    fn test_next_tier_hint_from_cart() {
        assert_eq!(
            next_tier_hint(&cart_with(&[("CHU-REL-20", 20)])).map(|hint| hint.units_needed),
            Some(4)
        );
        assert_eq!(next_tier_hint(&cart_with(&[("CHU-REL-20", 24)])), None);
    }

    #[test]
    fn test_empty_cart_prices_to_zero() {
        let totals = calculate_totals(&Cart::new()).unwrap();
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.tier, 1);
        assert!(!totals.meets_minimum());
    }

    #[test]
    fn test_checkout_requires_minimum() {
        assert_eq!(validate_for_checkout(&Cart::new()), Err(PricingError::Empty));
        assert_eq!(
            validate_for_checkout(&cart_with(&[("CHU-REL-20", 5)])),
            Err(PricingError::BelowMinimum { min: 6, actual: 5 })
        );
        assert!(validate_for_checkout(&cart_with(&[("CHU-REL-20", 6)])).is_ok());
    }

    #[test]
    fn test_add_merges_and_set_zero_removes() {
        let mut cart = cart_with(&[("ALF-CHO-12", 2)]);
        cart.add("ALF-CHO-12", 3).unwrap();
        assert_eq!(cart.quantity_of("ALF-CHO-12"), 5);
        assert_eq!(cart.lines().len(), 1);

        cart.set_quantity("ALF-CHO-12", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_rejects_unknown_sku_and_large_quantity() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add("PAN-AMASADO", 1),
            Err(PricingError::UnknownProduct("PAN-AMASADO".to_owned()))
        );
        assert!(matches!(
            cart.set_quantity("ALF-MAI-12", 1_000),
            Err(PricingError::QuantityTooLarge { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stale_sku_in_cart_fails_pricing() {
        let cart: Cart =
            serde_json::from_str(r#"{"lines":[{"sku":"DESCONTINUADO","quantity":3}]}"#).unwrap();
        assert!(matches!(
            calculate_totals(&cart),
            Err(PricingError::UnknownProduct(_))
        ));
    }
}
