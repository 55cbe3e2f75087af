//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod order;
pub mod profile;
pub mod session;
pub mod socio;

pub use order::{Order, OrderSummary};
pub use profile::{BusinessDetails, NewProfile, PortalAccess, Profile};
pub use session::{CurrentBuyer, keys as session_keys};
pub use socio::{NewSocioApplication, Socio};
