//! Distributor ("socio") management.
//!
//! Applications arrive from the public form as pending, hidden listings.
//! A socio shows on the public map only once it is approved, public and
//! geocoded.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use delicias_core::{ApprovalStatus, SocioId};
use serde::Deserialize;
use tracing::instrument;

use crate::db::SocioRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::models::{Socio, SocioInput};
use crate::services::GeocodeError;
use crate::state::AppState;
use crate::views::{AdminUserView, FilterTab, SocioView, approval_tabs};

use super::{ListQuery, notice_message, render};

// =============================================================================
// Form Types
// =============================================================================

/// Socio form data, as posted by the create and edit pages.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SocioForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub comuna: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub instagram: String,
    /// Checkbox; only sent when checked.
    pub publicar: Option<String>,
}

impl SocioForm {
    fn to_input(&self) -> SocioInput {
        SocioInput {
            name: self.name.clone(),
            address: self.address.clone(),
            comuna: self.comuna.clone(),
            region: self.region.clone(),
            phone: Some(self.phone.clone()),
            email: Some(self.email.clone()),
            instagram: Some(self.instagram.clone()),
        }
    }

    const fn is_public(&self) -> bool {
        self.publicar.is_some()
    }
}

impl From<&Socio> for SocioForm {
    fn from(socio: &Socio) -> Self {
        Self {
            name: socio.name.clone(),
            address: socio.address.clone(),
            comuna: socio.comuna.clone(),
            region: socio.region.clone(),
            phone: socio.phone.clone().unwrap_or_default(),
            email: socio.email.clone().unwrap_or_default(),
            instagram: socio.instagram.clone().unwrap_or_default(),
            publicar: socio.is_public.then(|| "1".to_string()),
        }
    }
}

/// Visibility toggle form data.
#[derive(Debug, Deserialize)]
pub struct VisibilityForm {
    pub publico: bool,
}

// =============================================================================
// Templates
// =============================================================================

/// Socio list template.
#[derive(Template)]
#[template(path = "socios/index.html")]
pub struct SociosTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub tabs: Vec<FilterTab>,
    pub socios: Vec<SocioView>,
    pub notice: Option<String>,
    pub error_message: Option<String>,
}

/// Create/edit form template.
#[derive(Template)]
#[template(path = "socios/form.html")]
pub struct SocioFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub form: SocioForm,
    /// `None` while creating.
    pub socio: Option<SocioView>,
    pub notice: Option<String>,
    pub error_message: Option<String>,
}

/// Parse `?estado=`; empty means every status.
fn status_filter(raw: Option<&str>) -> Result<Option<ApprovalStatus>, AppError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|value| {
            value
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Estado desconocido: {value}")))
        })
        .transpose()
}

fn edit_redirect(id: SocioId, query: &str) -> Response {
    Redirect::to(&format!("/socios/{id}/editar?{query}")).into_response()
}

// =============================================================================
// Pages
// =============================================================================

/// List socios, optionally filtered by status.
///
/// GET /socios
///
/// # Errors
///
/// Returns an error for an unknown status or if the query fails.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let status = status_filter(query.estado.as_deref())?;
    let socios = SocioRepository::new(state.pool()).list(status).await?;

    Ok(render(&SociosTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/socios".to_string(),
        tabs: approval_tabs(status, true),
        socios: socios.iter().map(SocioView::from).collect(),
        notice: query.aviso.as_deref().map(notice_message),
        error_message: query.error.as_deref().map(notice_message),
    }))
}

/// Blank form for a new socio.
///
/// GET /socios/nuevo
#[instrument(skip(admin))]
pub async fn new_page(RequireWriter(admin): RequireWriter) -> Response {
    render(&SocioFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/socios".to_string(),
        form: SocioForm::default(),
        socio: None,
        notice: None,
        error_message: None,
    })
}

/// Create a socio. Listings added by staff start approved.
///
/// POST /socios
///
/// # Errors
///
/// Returns an error if the insert fails.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Form(form): Form<SocioForm>,
) -> Result<Response, AppError> {
    let input = match form.to_input().normalized() {
        Ok(input) => input,
        Err(message) => {
            return Ok(render(&SocioFormTemplate {
                admin_user: AdminUserView::from(&admin),
                current_path: "/socios".to_string(),
                form,
                socio: None,
                notice: None,
                error_message: Some(message),
            }));
        }
    };

    let socio = SocioRepository::new(state.pool())
        .create(&input, ApprovalStatus::Approved, form.is_public())
        .await?;
    tracing::info!(socio_id = %socio.id, name = %socio.name, "Socio created");

    Ok(edit_redirect(socio.id, "aviso=socio_creado"))
}

/// Edit form for an existing socio, with its status and actions.
///
/// GET /socios/{id}/editar
///
/// # Errors
///
/// Returns 404 if the socio does not exist.
#[instrument(skip(admin, state))]
pub async fn edit_page(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let socio = SocioRepository::new(state.pool())
        .get_by_id(SocioId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("socio {id}")))?;

    Ok(render(&SocioFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/socios".to_string(),
        form: SocioForm::from(&socio),
        socio: Some(SocioView::from(&socio)),
        notice: query.aviso.as_deref().map(notice_message),
        error_message: query.error.as_deref().map(notice_message),
    }))
}

/// Save edits. A changed address or comuna clears the coordinates.
///
/// POST /socios/{id}
///
/// # Errors
///
/// Returns 404 if the socio does not exist.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<SocioForm>,
) -> Result<Response, AppError> {
    let repo = SocioRepository::new(state.pool());
    let id = SocioId::new(id);

    let input = match form.to_input().normalized() {
        Ok(input) => input,
        Err(message) => {
            let socio = repo
                .get_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("socio {id}")))?;
            return Ok(render(&SocioFormTemplate {
                admin_user: AdminUserView::from(&admin),
                current_path: "/socios".to_string(),
                form,
                socio: Some(SocioView::from(&socio)),
                notice: None,
                error_message: Some(message),
            }));
        }
    };

    let mut socio = repo.update(id, &input).await?;
    if socio.is_public != form.is_public() {
        socio = repo.set_visibility(id, form.is_public()).await?;
    }
    tracing::info!(socio_id = %socio.id, geocoded = socio.location.is_some(), "Socio updated");

    Ok(edit_redirect(id, "aviso=socio_guardado"))
}

// =============================================================================
// Actions
// =============================================================================

/// Approve a socio.
///
/// POST /socios/{id}/aprobar
///
/// # Errors
///
/// Returns 404 if the socio does not exist.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn approve(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let socio = SocioRepository::new(state.pool())
        .set_status(SocioId::new(id), ApprovalStatus::Approved)
        .await?;
    tracing::info!(socio_id = %socio.id, "Socio approved");

    Ok(edit_redirect(socio.id, "aviso=socio_aprobado"))
}

/// Reject a socio, which also takes it off the map.
///
/// POST /socios/{id}/rechazar
///
/// # Errors
///
/// Returns 404 if the socio does not exist.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn reject(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let socio = SocioRepository::new(state.pool())
        .set_status(SocioId::new(id), ApprovalStatus::Rejected)
        .await?;
    tracing::info!(socio_id = %socio.id, "Socio rejected");

    Ok(edit_redirect(socio.id, "aviso=socio_rechazado"))
}

/// Show a socio on, or hide it from, the public map.
///
/// POST /socios/{id}/visibilidad
///
/// # Errors
///
/// Returns 404 if the socio does not exist.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn toggle_visibility(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<VisibilityForm>,
) -> Result<Response, AppError> {
    let socio = SocioRepository::new(state.pool())
        .set_visibility(SocioId::new(id), form.publico)
        .await?;
    tracing::info!(socio_id = %socio.id, is_public = socio.is_public, "Socio visibility changed");

    let notice = if socio.is_public {
        "aviso=socio_visible"
    } else {
        "aviso=socio_oculto"
    };
    Ok(edit_redirect(socio.id, notice))
}

/// Resolve the socio's address and store the coordinates.
///
/// POST /socios/{id}/geocodificar
///
/// # Errors
///
/// Returns 404 if the socio does not exist. Geocoder failures redirect back
/// to the form with a message.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn geocode(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let repo = SocioRepository::new(state.pool());
    let socio = repo
        .get_by_id(SocioId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("socio {id}")))?;

    let location = match state.geocoder().geocode(&socio.geocode_query()).await {
        Ok(location) => location,
        Err(GeocodeError::NotFound(_)) => {
            tracing::info!(socio_id = %socio.id, "Geocoder found no match");
            return Ok(edit_redirect(socio.id, "error=sin_direccion"));
        }
        Err(e) => {
            tracing::error!(socio_id = %socio.id, error = %e, "Geocoding failed");
            return Ok(edit_redirect(socio.id, "error=mapa"));
        }
    };

    let socio = repo.set_location(socio.id, location).await?;
    tracing::info!(
        socio_id = %socio.id,
        lat = location.latitude(),
        lng = location.longitude(),
        "Socio geocoded"
    );

    Ok(edit_redirect(socio.id, "aviso=socio_ubicado"))
}

/// Delete a socio.
///
/// POST /socios/{id}/eliminar
///
/// # Errors
///
/// Returns 404 if the socio does not exist.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    SocioRepository::new(state.pool())
        .delete(SocioId::new(id))
        .await?;
    tracing::info!(socio_id = id, "Socio deleted");

    Ok(Redirect::to("/socios?aviso=socio_eliminado").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_allows_all() {
        assert_eq!(status_filter(None).unwrap(), None);
        assert_eq!(status_filter(Some("")).unwrap(), None);
        assert_eq!(
            status_filter(Some("pending")).unwrap(),
            Some(ApprovalStatus::Pending)
        );
        assert!(status_filter(Some("todos")).is_err());
    }

    #[test]
    fn test_form_blank_optionals_become_none() {
        let form = SocioForm {
            name: " Minimarket Los Andes ".to_string(),
            address: "Independencia 540".to_string(),
            comuna: "Los Andes".to_string(),
            region: "Valparaíso".to_string(),
            instagram: "@losandes".to_string(),
            publicar: Some("1".to_string()),
            ..SocioForm::default()
        };
        assert!(form.is_public());

        let input = form.to_input().normalized().unwrap();
        assert_eq!(input.name, "Minimarket Los Andes");
        assert_eq!(input.phone, None);
        assert_eq!(input.email, None);
        assert_eq!(input.instagram.as_deref(), Some("@losandes"));
    }

    #[test]
    fn test_unchecked_box_means_hidden() {
        assert!(!SocioForm::default().is_public());
    }

    #[test]
    fn test_form_missing_comuna_is_reported() {
        let form = SocioForm {
            name: "Almacén Sur".to_string(),
            address: "Maipú 12".to_string(),
            region: "Los Lagos".to_string(),
            ..SocioForm::default()
        };
        assert_eq!(
            form.to_input().normalized().unwrap_err(),
            "Falta completar: comuna"
        );
    }
}
