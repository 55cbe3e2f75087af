//! Partner ("socio") application form.
//!
//! Applications are stored as pending, hidden socios; the back office approves
//! them and geocodes the address before they appear on the map.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use delicias_core::Email;
use serde::Deserialize;
use tracing::instrument;

use crate::db::{RepositoryError, SocioRepository};
use crate::error::AppError;
use crate::filters;
use crate::models::NewSocioApplication;
use crate::state::AppState;

/// Partner application form data.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PartnerForm {
    pub name: String,
    pub address: String,
    pub comuna: String,
    pub region: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub instagram: String,
}

/// Application form template.
#[derive(Template, WebTemplate)]
#[template(path = "partners/apply.html")]
pub struct ApplyTemplate {
    pub form: PartnerForm,
    pub error: Option<String>,
}

/// Application received template.
#[derive(Template, WebTemplate)]
#[template(path = "partners/thanks.html")]
pub struct ThanksTemplate {
    pub name: String,
}

/// Display the application form.
#[instrument]
pub async fn apply_page() -> impl IntoResponse {
    ApplyTemplate {
        form: PartnerForm::default(),
        error: None,
    }
}

/// Handle an application.
///
/// # Errors
///
/// Returns an error if the database fails.
#[instrument(skip(state, form), fields(comuna = %form.comuna))]
pub async fn apply(
    State(state): State<AppState>,
    Form(form): Form<PartnerForm>,
) -> Result<Response, AppError> {
    let application = match parse_application(&form) {
        Ok(application) => application,
        Err(error) => {
            return Ok(ApplyTemplate {
                form,
                error: Some(error),
            }
            .into_response());
        }
    };

    let socio = match SocioRepository::new(state.pool())
        .create_application(&application)
        .await
    {
        Ok(socio) => socio,
        Err(RepositoryError::Conflict(_)) => {
            return Ok(ApplyTemplate {
                form,
                error: Some("Ya recibimos una postulación con ese nombre en esa comuna".to_string()),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(socio_id = %socio.id, "Partner application received");

    if let Err(e) = state.email().notify_new_socio(&socio).await {
        tracing::error!(error = %e, socio_id = %socio.id, "Failed to notify partner application");
    }

    Ok(ThanksTemplate { name: socio.name }.into_response())
}

/// Trim the form and check required fields.
fn parse_application(form: &PartnerForm) -> Result<NewSocioApplication, String> {
    fn required(value: &str, label: &str) -> Result<String, String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(format!("Falta completar: {label}"));
        }
        Ok(trimmed.to_owned())
    }

    fn optional(value: &str) -> Option<String> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }

    let email = optional(&form.email)
        .map(|email| Email::parse(&email))
        .transpose()
        .map_err(|_| "El correo no es válido".to_string())?;

    if form.phone.trim().is_empty() && email.is_none() {
        return Err("Indica un teléfono o un correo de contacto".to_string());
    }

    Ok(NewSocioApplication {
        name: required(&form.name, "nombre del local")?,
        address: required(&form.address, "dirección")?,
        comuna: required(&form.comuna, "comuna")?,
        region: required(&form.region, "región")?,
        phone: optional(&form.phone),
        email,
        instagram: optional(&form.instagram).map(|handle| {
            if handle.starts_with('@') {
                handle
            } else {
                format!("@{handle}")
            }
        }),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> PartnerForm {
        PartnerForm {
            name: " Almacén Rosita ".to_owned(),
            address: "Freire 880".to_owned(),
            comuna: "Quilpué".to_owned(),
            region: "Valparaíso".to_owned(),
            phone: String::new(),
            email: "Rosita@Gmail.com".to_owned(),
            instagram: "almacenrosita".to_owned(),
        }
    }

    #[test]
    fn test_parse_application_normalizes() {
        let application = parse_application(&form()).unwrap();
        assert_eq!(application.name, "Almacén Rosita");
        assert_eq!(application.phone, None);
        assert_eq!(application.email.unwrap().as_str(), "rosita@gmail.com");
        assert_eq!(application.instagram.as_deref(), Some("@almacenrosita"));
    }

    #[test]
    fn test_parse_application_requires_contact() {
        let mut no_contact = form();
        no_contact.email = "  ".to_owned();
        assert!(parse_application(&no_contact).is_err());

        no_contact.phone = "+56 9 8765 4321".to_owned();
        assert!(parse_application(&no_contact).is_ok());
    }

    #[test]
    fn test_parse_application_rejects_bad_email_and_blanks() {
        let mut bad = form();
        bad.email = "no-es-correo".to_owned();
        assert_eq!(parse_application(&bad).unwrap_err(), "El correo no es válido");

        let mut blank = form();
        blank.region = String::new();
        assert_eq!(
            parse_application(&blank).unwrap_err(),
            "Falta completar: región"
        );
    }
}
