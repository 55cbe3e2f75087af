//! Buyer authentication route handlers.
//!
//! Registration, email verification, login/logout and password reset.
//! Logging in works for any approval state; the portal extractor decides
//! what the buyer may see.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, auth_message, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{RequireBuyer, clear_current_buyer, set_current_buyer};
use crate::models::{BusinessDetails, CurrentBuyer};
use crate::services::{AuthError, AuthService, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub business_name: String,
    pub rut: String,
    pub contact_name: String,
    pub phone: String,
    pub address: String,
    pub comuna: String,
    pub city: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Query carrying an emailed token.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub form: RegisterForm,
    pub error: Option<String>,
}

/// Registration success page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_success.html")]
pub struct RegisterSuccessTemplate {
    pub email: String,
}

/// Email verification result template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verified.html")]
pub struct VerifiedTemplate {
    pub verified: bool,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub sent: bool,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub token: String,
    /// False when the link is unknown, used or expired.
    pub valid: bool,
    pub error: Option<String>,
}

/// Map a login page message code to text.
fn login_message(code: &str) -> String {
    match code {
        "credentials" => "Correo o contraseña incorrectos",
        "session" => "No pudimos iniciar tu sesión, intenta nuevamente",
        "password_reset" => "Tu contraseña fue actualizada. Ya puedes ingresar",
        _ => "Algo salió mal, intenta nuevamente",
    }
    .to_string()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(login_message),
        success: query.success.as_deref().map(login_message),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let profile = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(profile) => profile,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed: invalid credentials");
            return Redirect::to("/auth/login?error=credentials").into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    let buyer = CurrentBuyer {
        id: profile.id,
        email: profile.email.clone(),
        business_name: profile.business.business_name.clone(),
    };

    if let Err(e) = set_current_buyer(&session, &buyer).await {
        tracing::error!(error = %e, "Failed to set session");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    set_sentry_user(&profile.id, Some(profile.email.as_str()));
    tracing::info!(profile_id = %profile.id, "Buyer logged in");

    Redirect::to("/mayorista").into_response()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_buyer(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
    Redirect::to("/").into_response()
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {
        form: RegisterForm::default(),
        error: None,
    }
}

/// Handle registration form submission.
///
/// Creates a pending, unverified profile and emails the verification link.
#[instrument(skip(state, form))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    if form.password != form.password_confirm {
        return RegisterTemplate {
            form: RegisterForm {
                password: String::new(),
                password_confirm: String::new(),
                ..form
            },
            error: Some("Las contraseñas no coinciden".to_string()),
        }
        .into_response();
    }

    let registration = Registration {
        email: &form.email,
        password: &form.password,
        business: BusinessDetails {
            business_name: form.business_name.clone(),
            rut: form.rut.clone(),
            contact_name: form.contact_name.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
            comuna: form.comuna.clone(),
            city: form.city.clone(),
        },
    };

    let (profile, token) = match AuthService::new(state.pool()).register(registration).await {
        Ok(created) => created,
        Err(e @ (AuthError::Repository(_) | AuthError::PasswordHash)) => {
            return AppError::from(e).into_response();
        }
        Err(e) => {
            tracing::info!(error = %e, "Registration rejected");
            return RegisterTemplate {
                error: Some(auth_message(&e)),
                form: RegisterForm {
                    password: String::new(),
                    password_confirm: String::new(),
                    ..form
                },
            }
            .into_response();
        }
    };

    tracing::info!(profile_id = %profile.id, "Buyer registered");

    let link = state
        .config()
        .url(&format!("/auth/verificar?token={token}"));
    if let Err(e) = state
        .email()
        .send_verification(
            profile.email.as_str(),
            &profile.business.business_name,
            &link,
        )
        .await
    {
        tracing::error!(error = %e, profile_id = %profile.id, "Failed to send verification email");
    }
    if let Err(e) = state.email().notify_new_registration(&profile).await {
        tracing::error!(error = %e, profile_id = %profile.id, "Failed to notify registration");
    }

    RegisterSuccessTemplate {
        email: profile.email.to_string(),
    }
    .into_response()
}

/// Confirm the email address from the emailed link.
#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Response {
    match AuthService::new(state.pool()).verify_email(&query.token).await {
        Ok(profile_id) => {
            tracing::info!(%profile_id, "Email verified");
            VerifiedTemplate { verified: true }.into_response()
        }
        Err(AuthError::InvalidToken) => VerifiedTemplate { verified: false }.into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Email a fresh verification link to the logged-in buyer.
///
/// Issuing retires the previous link. Already verified buyers go straight
/// to the portal.
#[instrument(skip_all, fields(profile_id = %buyer.id))]
pub async fn resend_verification(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
) -> Response {
    let (profile, token) = match AuthService::new(state.pool())
        .resend_verification(buyer.id)
        .await
    {
        Ok(Some(issued)) => issued,
        Ok(None) => return Redirect::to("/mayorista").into_response(),
        Err(e) => return AppError::from(e).into_response(),
    };

    let link = state
        .config()
        .url(&format!("/auth/verificar?token={token}"));
    if let Err(e) = state
        .email()
        .send_verification(
            profile.email.as_str(),
            &profile.business.business_name,
            &link,
        )
        .await
    {
        tracing::error!(error = %e, profile_id = %profile.id, "Failed to resend verification email");
        return Redirect::to("/mayorista/pendiente?aviso=error_correo").into_response();
    }

    tracing::info!(profile_id = %profile.id, "Verification email resent");
    Redirect::to("/mayorista/pendiente?aviso=reenviado").into_response()
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page() -> impl IntoResponse {
    ForgotPasswordTemplate { sent: false }
}

/// Handle forgot password form submission.
///
/// Always shows the same confirmation so the form does not reveal which
/// addresses have accounts.
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    match AuthService::new(state.pool())
        .request_password_reset(&form.email)
        .await
    {
        Ok(Some((profile, token))) => {
            let link = state
                .config()
                .url(&format!("/auth/restablecer?token={token}"));
            if let Err(e) = state
                .email()
                .send_password_reset(profile.email.as_str(), &link)
                .await
            {
                tracing::error!(error = %e, profile_id = %profile.id, "Failed to send reset email");
            }
        }
        Ok(None) => tracing::info!("Password reset requested for unknown email"),
        Err(e) => tracing::error!(error = %e, "Password reset request failed"),
    }

    ForgotPasswordTemplate { sent: true }.into_response()
}

/// Display the reset password page.
#[instrument(skip(state, query))]
pub async fn reset_password_page(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Response {
    match AuthService::new(state.pool())
        .is_reset_token_live(&query.token)
        .await
    {
        Ok(valid) => ResetPasswordTemplate {
            token: query.token,
            valid,
            error: None,
        }
        .into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Handle reset password form submission.
#[instrument(skip(state, query, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    if form.password != form.password_confirm {
        return ResetPasswordTemplate {
            token: query.token,
            valid: true,
            error: Some("Las contraseñas no coinciden".to_string()),
        }
        .into_response();
    }

    match AuthService::new(state.pool())
        .reset_password(&query.token, &form.password)
        .await
    {
        Ok(profile_id) => {
            tracing::info!(%profile_id, "Password reset");
            Redirect::to("/auth/login?success=password_reset").into_response()
        }
        Err(AuthError::InvalidToken) => ResetPasswordTemplate {
            token: query.token,
            valid: false,
            error: None,
        }
        .into_response(),
        Err(e @ AuthError::WeakPassword(_)) => ResetPasswordTemplate {
            token: query.token,
            valid: true,
            error: Some(auth_message(&e)),
        }
        .into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, extract::FromRequest, http::Request};

    use super::*;

    #[test]
    fn test_login_message_codes() {
        assert_eq!(login_message("credentials"), "Correo o contraseña incorrectos");
        assert!(login_message("password_reset").contains("actualizada"));
        assert_eq!(login_message("???"), "Algo salió mal, intenta nuevamente");
    }

    #[tokio::test]
    async fn test_register_form_deserializes() {
        let body = "email=a%40b.cl&password=12345678&password_confirm=12345678\
                    &business_name=Pan&rut=1-9&contact_name=Ana&phone=123\
                    &address=Calle+1&comuna=Maip%C3%BA&city=Santiago";
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();

        let Form(form) = Form::<RegisterForm>::from_request(request, &()).await.unwrap();
        assert_eq!(form.email, "a@b.cl");
        assert_eq!(form.comuna, "Maipú");
    }
}
