//! Distributor ("socio") listings.

use chrono::{DateTime, Utc};

use delicias_core::{ApprovalStatus, Coordinates, Email, Located, SocioId};

/// A distributor listing.
#[derive(Debug, Clone)]
pub struct Socio {
    pub id: SocioId,
    pub name: String,
    pub address: String,
    pub comuna: String,
    pub region: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub instagram: Option<String>,
    /// Set once the address has been geocoded.
    pub location: Option<Coordinates>,
    pub status: ApprovalStatus,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Socio {
    /// Whether the socio belongs on the public map.
    #[must_use]
    pub const fn is_listed(&self) -> bool {
        matches!(self.status, ApprovalStatus::Approved) && self.is_public && self.location.is_some()
    }
}

impl Located for Socio {
    fn coordinates(&self) -> Option<Coordinates> {
        self.location
    }
}

/// A partner application submitted from the public form.
#[derive(Debug, Clone)]
pub struct NewSocioApplication {
    pub name: String,
    pub address: String,
    pub comuna: String,
    pub region: String,
    pub phone: Option<String>,
    pub email: Option<Email>,
    pub instagram: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn socio(status: ApprovalStatus, is_public: bool, location: Option<Coordinates>) -> Socio {
        Socio {
            id: SocioId::new(1),
            name: "Minimarket La Esquina".to_owned(),
            address: "Los Carrera 455".to_owned(),
            comuna: "Concepción".to_owned(),
            region: "Biobío".to_owned(),
            phone: None,
            email: None,
            instagram: None,
            location,
            status,
            is_public,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_listed_needs_approval_visibility_and_location() {
        let here = Some(Coordinates::new(-36.82, -73.04).unwrap());
        assert!(socio(ApprovalStatus::Approved, true, here).is_listed());
        assert!(!socio(ApprovalStatus::Approved, false, here).is_listed());
        assert!(!socio(ApprovalStatus::Pending, true, here).is_listed());
        assert!(!socio(ApprovalStatus::Approved, true, None).is_listed());
    }
}
