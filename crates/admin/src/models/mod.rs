//! Domain models for the back office.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod admin_user;
pub mod order;
pub mod profile;
pub mod session;
pub mod socio;

pub use admin_user::{AdminRole, AdminUser, NewAdminUser};
pub use order::{Order, OrderSummary};
pub use profile::Profile;
pub use session::{CurrentAdmin, keys as session_keys};
pub use socio::{Socio, SocioInput};
