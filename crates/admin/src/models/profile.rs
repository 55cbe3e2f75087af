//! Buyer accounts awaiting or past review.

use chrono::{DateTime, Utc};

use delicias_core::{ApprovalStatus, Email, ProfileId};

/// A wholesale buyer account.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: ProfileId,
    pub email: Email,
    pub email_verified: bool,
    pub approval_status: ApprovalStatus,
    pub business_name: String,
    pub rut: String,
    pub contact_name: String,
    pub phone: String,
    pub address: String,
    pub comuna: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    /// When an admin last approved or rejected the account.
    pub reviewed_at: Option<DateTime<Utc>>,
}
