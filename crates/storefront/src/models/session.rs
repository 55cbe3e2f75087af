//! Session-related types.

use serde::{Deserialize, Serialize};

use delicias_core::{Email, ProfileId};

/// Session-stored buyer identity.
///
/// Approval state is deliberately absent: it is re-read from the database on
/// every gated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentBuyer {
    /// Profile ID.
    pub id: ProfileId,
    /// Account email.
    pub email: Email,
    /// Business name, for the page header.
    pub business_name: String,
}

/// Session keys.
pub mod keys {
    /// Key for the logged-in buyer.
    pub const CURRENT_BUYER: &str = "current_buyer";

    /// Key for the wholesale cart.
    pub const CART: &str = "cart";
}
