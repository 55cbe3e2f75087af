//! Order snapshot stored with every wholesale order.
//!
//! The payload freezes what the buyer saw at checkout (business details,
//! priced lines and totals) so later catalog changes never alter past orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::{CartTotals, PricedLine};

/// Buyer business details at the time of the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessSnapshot {
    /// Registered business name.
    pub business_name: String,
    /// Chilean tax id, as entered.
    pub rut: String,
    /// Person placing the order.
    pub contact_name: String,
    /// Account email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Delivery address.
    pub address: String,
    /// Comuna of the delivery address.
    pub comuna: String,
    /// City of the delivery address.
    pub city: String,
}

/// Totals copied from [`CartTotals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Units across all lines.
    pub total_units: u32,
    /// 1-based tier applied.
    pub tier: usize,
    /// Net subtotal.
    pub subtotal: Decimal,
    /// IVA.
    pub tax: Decimal,
    /// Gross total.
    pub total: Decimal,
    /// Discount against first-tier prices.
    pub savings: Decimal,
}

/// Everything persisted in the order's JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayload {
    /// Buyer details.
    pub business: BusinessSnapshot,
    /// Priced lines.
    pub lines: Vec<PricedLine>,
    /// Order totals.
    pub totals: OrderTotals,
}

impl OrderPayload {
    /// Freeze a priced cart for `business`.
    #[must_use]
    pub fn new(business: BusinessSnapshot, totals: CartTotals) -> Self {
        let order_totals = OrderTotals {
            total_units: totals.total_units,
            tier: totals.tier,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            savings: totals.savings,
        };
        Self {
            business,
            lines: totals.lines,
            totals: order_totals,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pricing::{Cart, calculate_totals};

    fn business() -> BusinessSnapshot {
        BusinessSnapshot {
            business_name: "Almacén Don Lucho".to_owned(),
            rut: "76.123.456-7".to_owned(),
            contact_name: "Luis Pérez".to_owned(),
            email: "compras@donlucho.cl".to_owned(),
            phone: "+56 9 1234 5678".to_owned(),
            address: "Av. Matta 1020".to_owned(),
            comuna: "Santiago".to_owned(),
            city: "Santiago".to_owned(),
        }
    }

    #[test]
    fn test_payload_keeps_totals_and_lines() {
        let mut cart = Cart::new();
        cart.add("ALF-MAI-12", 12).unwrap();
        let totals = calculate_totals(&cart).unwrap();
        let total = totals.total;

        let payload = OrderPayload::new(business(), totals);
        assert_eq!(payload.lines.len(), 1);
        assert_eq!(payload.totals.tier, 2);
        assert_eq!(payload.totals.total, total);
    }

    #[test]
    fn test_payload_json_shape() {
        let mut cart = Cart::new();
        cart.add("BRO-NUE-9", 6).unwrap();
        let payload = OrderPayload::new(business(), calculate_totals(&cart).unwrap());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["business"]["comuna"], "Santiago");
        assert_eq!(json["lines"][0]["sku"], "BRO-NUE-9");
        // Decimals are stored as strings to keep exact pesos.
        assert_eq!(json["totals"]["subtotal"], "56940");

        let back: OrderPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }
}
