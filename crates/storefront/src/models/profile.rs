//! Wholesale buyer profile.

use chrono::{DateTime, Utc};

use delicias_core::{ApprovalStatus, BusinessSnapshot, Email, ProfileId};

/// Business details entered at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessDetails {
    pub business_name: String,
    /// Chilean tax id, kept as typed.
    pub rut: String,
    pub contact_name: String,
    pub phone: String,
    pub address: String,
    pub comuna: String,
    pub city: String,
}

/// A wholesale buyer account.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: ProfileId,
    pub email: Email,
    pub email_verified: bool,
    pub approval_status: ApprovalStatus,
    pub business: BusinessDetails,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Input for creating a profile.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: Email,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub business: BusinessDetails,
}

/// Whether a buyer may use the wholesale portal, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalAccess {
    Granted,
    EmailUnverified,
    AwaitingApproval,
    Rejected,
}

impl Profile {
    /// Portal access for the profile's current state.
    ///
    /// A rejection wins over an unverified email so the buyer sees the
    /// final decision.
    #[must_use]
    pub const fn access(&self) -> PortalAccess {
        match (self.approval_status, self.email_verified) {
            (ApprovalStatus::Rejected, _) => PortalAccess::Rejected,
            (_, false) => PortalAccess::EmailUnverified,
            (ApprovalStatus::Pending, true) => PortalAccess::AwaitingApproval,
            (ApprovalStatus::Approved, true) => PortalAccess::Granted,
        }
    }

    /// Business details frozen into an order.
    #[must_use]
    pub fn snapshot(&self) -> BusinessSnapshot {
        let b = &self.business;
        BusinessSnapshot {
            business_name: b.business_name.clone(),
            rut: b.rut.clone(),
            contact_name: b.contact_name.clone(),
            email: self.email.to_string(),
            phone: b.phone.clone(),
            address: b.address.clone(),
            comuna: b.comuna.clone(),
            city: b.city.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn profile(status: ApprovalStatus, verified: bool) -> Profile {
        Profile {
            id: ProfileId::new(7),
            email: Email::parse("compras@donlucho.cl").unwrap(),
            email_verified: verified,
            approval_status: status,
            business: BusinessDetails {
                business_name: "Almacén Don Lucho".to_owned(),
                rut: "76.123.456-7".to_owned(),
                contact_name: "Luis Pérez".to_owned(),
                phone: "+56 9 1234 5678".to_owned(),
                address: "Av. Matta 1020".to_owned(),
                comuna: "Santiago".to_owned(),
                city: "Santiago".to_owned(),
            },
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }

    #[test]
    fn test_access_requires_verification_and_approval() {
        use ApprovalStatus::{Approved, Pending, Rejected};

        assert_eq!(profile(Approved, true).access(), PortalAccess::Granted);
        assert_eq!(profile(Approved, false).access(), PortalAccess::EmailUnverified);
        assert_eq!(profile(Pending, false).access(), PortalAccess::EmailUnverified);
        assert_eq!(profile(Pending, true).access(), PortalAccess::AwaitingApproval);
        assert_eq!(profile(Rejected, false).access(), PortalAccess::Rejected);
        assert_eq!(profile(Rejected, true).access(), PortalAccess::Rejected);
    }

    #[test]
    fn test_snapshot_copies_business_fields() {
        let snapshot = profile(ApprovalStatus::Approved, true).snapshot();
        assert_eq!(snapshot.email, "compras@donlucho.cl");
        assert_eq!(snapshot.rut, "76.123.456-7");
        assert_eq!(snapshot.comuna, "Santiago");
    }
}
