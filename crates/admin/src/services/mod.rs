//! Business logic services for the back office.
//!
//! - `auth` - Password login and admin account creation
//! - `email` - Buyer notifications for approvals and order updates
//! - `geocoding` - Address lookup for the distributor map

pub mod auth;
pub mod email;
pub mod geocoding;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use geocoding::{GeocodeError, Geocoder};
