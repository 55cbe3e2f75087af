//! Authentication route handlers for admin.
//!
//! Email and password login for back office staff. Accounts come from the
//! CLI; there is no signup or reset flow here.

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

use super::render;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for login errors.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

fn login_error(code: &str) -> String {
    match code {
        "credentials" => "Correo o contraseña incorrectos",
        "session" => "No pudimos iniciar tu sesión, intenta nuevamente",
        _ => "Algo salió mal, intenta nuevamente",
    }
    .to_string()
}

/// Render the login page.
///
/// GET /auth/login
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }

    render(&LoginTemplate {
        error: query.error.as_deref().map(login_error),
    })
}

/// Handle login form submission.
///
/// POST /auth/login
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let admin = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(admin) => admin,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Admin login failed: invalid credentials");
            return Redirect::to("/auth/login?error=credentials").into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    let current = CurrentAdmin {
        id: admin.id,
        email: admin.email.clone(),
        name: admin.name.clone(),
        role: admin.role,
    };

    if let Err(e) = set_current_admin(&session, &current).await {
        tracing::error!(error = %e, "Failed to set session");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin logged in");

    Redirect::to("/").into_response()
}

/// Logout and clear session.
///
/// POST /auth/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
    Redirect::to("/auth/login").into_response()
}
