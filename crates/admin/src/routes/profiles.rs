//! Buyer account review.
//!
//! New wholesale accounts wait here until someone approves or rejects them.
//! The buyer is emailed either way; a failed email never undoes the
//! decision.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use delicias_core::{ApprovalStatus, ProfileId};
use tracing::instrument;

use crate::db::{ProfileCounts, ProfileRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::models::Profile;
use crate::state::AppState;
use crate::views::{AdminUserView, FilterTab, ProfileView, approval_tabs};

use super::{ListQuery, notice_message, render};

/// Profile list template.
#[derive(Template)]
#[template(path = "usuarios/index.html")]
pub struct ProfilesTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub tabs: Vec<FilterTab>,
    pub counts: ProfileCounts,
    pub status: ApprovalStatus,
    pub profiles: Vec<ProfileView>,
    pub notice: Option<String>,
    pub error_message: Option<String>,
}

/// Parse `?estado=` for the review queue, defaulting to pending.
pub(crate) fn queue_status(raw: Option<&str>) -> Result<ApprovalStatus, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ApprovalStatus::Pending),
        Some(value) => value
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Estado desconocido: {value}"))),
    }
}

/// List buyer accounts in one review state.
///
/// GET /usuarios
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
    let status = queue_status(query.estado.as_deref())?;
    let repo = ProfileRepository::new(state.pool());
    let profiles = repo.list_by_status(status).await?;
    let counts = repo.count_by_status().await?;

    Ok(render(&ProfilesTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/usuarios".to_string(),
        tabs: approval_tabs(Some(status), false),
        counts,
        status,
        profiles: profiles.iter().map(ProfileView::from).collect(),
        notice: query.aviso.as_deref().map(notice_message),
        error_message: query.error.as_deref().map(notice_message),
    }))
}

/// Approve a buyer account and email the portal link.
///
/// POST /usuarios/{id}/aprobar
///
/// # Errors
///
/// Returns 404 if the profile does not exist.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn approve(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let profile = ProfileRepository::new(state.pool())
        .set_status(ProfileId::new(id), ApprovalStatus::Approved)
        .await?;
    tracing::info!(profile_id = %profile.id, "Buyer account approved");

    let portal_link = state.config().storefront_url("/mayorista");
    let sent = state
        .email()
        .send_account_approved(&profile, &portal_link)
        .await;

    Ok(after_review(&profile, sent, "aprobado"))
}

/// Reject a buyer account and let them know.
///
/// POST /usuarios/{id}/rechazar
///
/// # Errors
///
/// Returns 404 if the profile does not exist.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn reject(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let profile = ProfileRepository::new(state.pool())
        .set_status(ProfileId::new(id), ApprovalStatus::Rejected)
        .await?;
    tracing::info!(profile_id = %profile.id, "Buyer account rejected");

    let sent = state.email().send_account_rejected(&profile).await;

    Ok(after_review(&profile, sent, "rechazado"))
}

/// Redirect back to the pending queue with the outcome.
fn after_review<E: std::fmt::Display>(
    profile: &Profile,
    sent: Result<(), E>,
    notice: &str,
) -> Response {
    match sent {
        Ok(()) => Redirect::to(&format!("/usuarios?aviso={notice}")).into_response(),
        Err(e) => {
            tracing::error!(profile_id = %profile.id, error = %e, "Failed to send review email");
            Redirect::to("/usuarios?error=correo").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_defaults_to_pending() {
        assert_eq!(queue_status(None).ok(), Some(ApprovalStatus::Pending));
        assert_eq!(queue_status(Some("  ")).ok(), Some(ApprovalStatus::Pending));
        assert_eq!(
            queue_status(Some("rejected")).ok(),
            Some(ApprovalStatus::Rejected)
        );
    }

    #[test]
    fn test_queue_rejects_unknown_status() {
        assert!(matches!(
            queue_status(Some("archived")),
            Err(AppError::BadRequest(_))
        ));
    }
}
