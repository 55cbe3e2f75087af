//! Delicias Florencia Core - Shared domain library.
//!
//! This crate provides the types and pure logic shared by every component:
//! - `storefront` - Public site, wholesale portal and distributor map
//! - `admin` - Back office for approvals, partners and orders
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. With the `postgres` feature the newtypes and enums
//! also implement the `sqlx` encode/decode traits.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, money formatting and statuses
//! - [`catalog`] - The fixed wholesale product catalog
//! - [`pricing`] - Cart, tiered unit pricing and order totals
//! - [`order`] - Order snapshot persisted as JSON with each order
//! - [`geo`] - Coordinates, Haversine distance and nearest-partner lookup

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod geo;
pub mod order;
pub mod pricing;
pub mod types;

pub use catalog::{PriceTier, Product, catalog, find_product};
pub use geo::{Coordinates, GeoError, Located, haversine_km, nearest};
pub use order::{BusinessSnapshot, OrderPayload, OrderTotals};
pub use pricing::{
    Cart, CartLine, CartTotals, MIN_ORDER_UNITS, NextTier, PricedLine, PricingError,
    calculate_totals, next_tier_hint, validate_for_checkout,
};
pub use types::*;
