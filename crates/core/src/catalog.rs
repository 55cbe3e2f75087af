//! The wholesale product catalog.
//!
//! The bakery sells a short, stable list of boxed products, so the catalog is
//! compiled in rather than stored. Each product carries volume tiers: the unit
//! price drops once the whole cart reaches a tier's `min_units`.

use rust_decimal::Decimal;
use serde::Serialize;

/// A volume price break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceTier {
    /// Minimum number of units in the cart for this price to apply.
    pub min_units: u32,
    /// Net unit price in whole Chilean pesos.
    pub unit_price_clp: i64,
}

impl PriceTier {
    /// Net unit price as a decimal amount.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        Decimal::from(self.unit_price_clp)
    }
}

/// A product sold through the wholesale portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Stable identifier used in carts and order payloads.
    pub sku: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Short description for the catalog page.
    pub description: &'static str,
    /// What one unit is (e.g. "caja 12 un.").
    pub unit_label: &'static str,
    /// Price tiers, ascending by `min_units`; the first starts at 1.
    pub tiers: &'static [PriceTier],
}

impl Product {
    /// The tier that applies when the cart holds `units` in total.
    ///
    /// Falls back to the first tier for quantities below every break.
    #[must_use]
    pub fn tier_for(&self, units: u32) -> Option<(usize, &PriceTier)> {
        self.tiers
            .iter()
            .enumerate()
            .rev()
            .find(|(_, tier)| tier.min_units <= units)
            .or_else(|| self.tiers.first().map(|tier| (0, tier)))
    }

    /// Net unit price when the cart holds `units` in total.
    #[must_use]
    pub fn unit_price_for(&self, units: u32) -> Decimal {
        self.tier_for(units)
            .map_or(Decimal::ZERO, |(_, tier)| tier.unit_price())
    }

    /// Price of the first tier, used as the reference for savings.
    #[must_use]
    pub fn base_price(&self) -> Decimal {
        self.tiers.first().map_or(Decimal::ZERO, PriceTier::unit_price)
    }
}

const STANDARD_BREAKS: (u32, u32) = (12, 24);

static CATALOG: &[Product] = &[
    Product {
        sku: "ALF-MAI-12",
        name: "Alfajores de maicena",
        description: "Rellenos con manjar y coco rallado.",
        unit_label: "caja 12 un.",
        tiers: &[
            PriceTier { min_units: 1, unit_price_clp: 6_490 },
            PriceTier { min_units: STANDARD_BREAKS.0, unit_price_clp: 5_990 },
            PriceTier { min_units: STANDARD_BREAKS.1, unit_price_clp: 5_490 },
        ],
    },
    Product {
        sku: "ALF-CHO-12",
        name: "Alfajores bañados en chocolate",
        description: "Masa de hoja con manjar, cobertura de chocolate semiamargo.",
        unit_label: "caja 12 un.",
        tiers: &[
            PriceTier { min_units: 1, unit_price_clp: 7_990 },
            PriceTier { min_units: STANDARD_BREAKS.0, unit_price_clp: 7_390 },
            PriceTier { min_units: STANDARD_BREAKS.1, unit_price_clp: 6_790 },
        ],
    },
    Product {
        sku: "CHU-REL-20",
        name: "Chilenitos",
        description: "Hojarasca con manjar y merengue.",
        unit_label: "caja 20 un.",
        tiers: &[
            PriceTier { min_units: 1, unit_price_clp: 8_990 },
            PriceTier { min_units: STANDARD_BREAKS.0, unit_price_clp: 8_290 },
            PriceTier { min_units: STANDARD_BREAKS.1, unit_price_clp: 7_590 },
        ],
    },
    Product {
        sku: "GAL-MAN-500",
        name: "Galletas de mantequilla",
        description: "Bolsa surtida de galletas artesanales.",
        unit_label: "bolsa 500 g",
        tiers: &[
            PriceTier { min_units: 1, unit_price_clp: 4_990 },
            PriceTier { min_units: STANDARD_BREAKS.0, unit_price_clp: 4_590 },
            PriceTier { min_units: STANDARD_BREAKS.1, unit_price_clp: 4_190 },
        ],
    },
    Product {
        sku: "BRO-NUE-9",
        name: "Brownies con nueces",
        description: "Bandeja de 9 porciones individuales envasadas.",
        unit_label: "bandeja 9 un.",
        tiers: &[
            PriceTier { min_units: 1, unit_price_clp: 9_490 },
            PriceTier { min_units: STANDARD_BREAKS.0, unit_price_clp: 8_790 },
            PriceTier { min_units: STANDARD_BREAKS.1, unit_price_clp: 8_090 },
        ],
    },
];

/// All products, in display order.
#[must_use]
pub fn catalog() -> &'static [Product] {
    CATALOG
}

/// Look up a product by SKU.
#[must_use]
pub fn find_product(sku: &str) -> Option<&'static Product> {
    CATALOG.iter().find(|p| p.sku == sku)
}

/// Tier thresholds shared by the catalog, for the pricing table.
#[must_use]
pub fn tier_thresholds() -> Vec<u32> {
    CATALOG
        .first()
        .map(|p| p.tiers.iter().map(|t| t.min_units).collect())
        .unwrap_or_default()
}
