//! Distributor ("socio") listings.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use delicias_core::{ApprovalStatus, Coordinates, Email, SocioId};

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
    pub updated_at: DateTime<Utc>,
}

impl Socio {
    /// Whether the socio currently shows on the public map.
    #[must_use]
    pub const fn is_listed(&self) -> bool {
        matches!(self.status, ApprovalStatus::Approved) && self.is_public && self.location.is_some()
    }

    /// Free-text query sent to the geocoder.
    #[must_use]
    pub fn geocode_query(&self) -> String {
        format!("{}, {}, {}, Chile", self.address, self.comuna, self.region)
    }
}

/// Editable socio fields, from the back office form or a seed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SocioInput {
    pub name: String,
    pub address: String,
    pub comuna: String,
    pub region: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
}

impl SocioInput {
    /// Trim every field, turn blank optionals into `None` and validate.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn normalized(self) -> Result<Self, String> {
        let required = |value: String, label: &str| {
            let value = value.trim().to_owned();
            if value.is_empty() {
                Err(format!("Falta completar: {label}"))
            } else {
                Ok(value)
            }
        };
        let optional = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let email = optional(self.email)
            .map(|e| {
                Email::parse(&e)
                    .map(Email::into_inner)
                    .map_err(|_| format!("El correo no es válido: {e}"))
            })
            .transpose()?;

        Ok(Self {
            name: required(self.name, "nombre")?,
            address: required(self.address, "dirección")?,
            comuna: required(self.comuna, "comuna")?,
            region: required(self.region, "región")?,
            phone: optional(self.phone),
            email,
            instagram: optional(self.instagram),
        })
    }
}

impl From<&Socio> for SocioInput {
    fn from(socio: &Socio) -> Self {
        Self {
            name: socio.name.clone(),
            address: socio.address.clone(),
            comuna: socio.comuna.clone(),
            region: socio.region.clone(),
            phone: socio.phone.clone(),
            email: socio.email.clone(),
            instagram: socio.instagram.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> SocioInput {
        SocioInput {
            name: "  Panadería El Trigal ".to_owned(),
            address: "Av. Alemania 0671".to_owned(),
            comuna: "Temuco".to_owned(),
            region: "La Araucanía".to_owned(),
            phone: Some("   ".to_owned()),
            email: Some(" Ventas@ElTrigal.cl ".to_owned()),
            instagram: None,
        }
    }

    #[test]
    fn test_normalized_trims_and_drops_blank_optionals() {
        let socio = input().normalized().unwrap();
        assert_eq!(socio.name, "Panadería El Trigal");
        assert_eq!(socio.phone, None);
        assert_eq!(socio.email.as_deref(), Some("ventas@eltrigal.cl"));
    }

    #[test]
    fn test_normalized_rejects_missing_required_field() {
        let err = SocioInput {
            comuna: " ".to_owned(),
            ..input()
        }
        .normalized()
        .unwrap_err();
        assert_eq!(err, "Falta completar: comuna");
    }

    #[test]
    fn test_normalized_rejects_bad_email() {
        let err = SocioInput {
            email: Some("no-es-correo".to_owned()),
            ..input()
        }
        .normalized()
        .unwrap_err();
        assert!(err.contains("no-es-correo"));
    }

    #[test]
    fn test_geocode_query_includes_country() {
        let socio = Socio {
            id: SocioId::new(3),
            name: "Panadería El Trigal".to_owned(),
            address: "Av. Alemania 0671".to_owned(),
            comuna: "Temuco".to_owned(),
            region: "La Araucanía".to_owned(),
            phone: None,
            email: None,
            instagram: None,
            location: None,
            status: ApprovalStatus::Approved,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(
            socio.geocode_query(),
            "Av. Alemania 0671, Temuco, La Araucanía, Chile"
        );
        assert!(!socio.is_listed());
    }
}
