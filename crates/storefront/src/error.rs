//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use delicias_core::PricingError;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, EmailError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart could not be priced or checked out.
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Email could not be rendered or sent.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(RepositoryError::NotFound | RepositoryError::Conflict(_)) => false,
            Self::Database(_) | Self::Email(_) | Self::Session(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Email(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::MissingField(_)
                | AuthError::InvalidToken => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Pricing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show to the buyer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "No encontrado".to_string(),
            Self::Database(RepositoryError::Conflict(_)) => {
                "El registro ya existe".to_string()
            }
            Self::Auth(err) => auth_message(err),
            Self::Pricing(err) => pricing_message(err),
            Self::NotFound(_) => "Página no encontrada".to_string(),
            Self::Unauthorized(_) => "Debes iniciar sesión".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Demasiadas solicitudes, intenta en un momento".to_string(),
            // Don't expose internal error details to clients
            _ => "Error interno del servidor".to_string(),
        }
    }
}

/// Buyer-facing text for an authentication failure.
#[must_use]
pub fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials => "Correo o contraseña incorrectos".to_string(),
        AuthError::EmailTaken => "Ya existe una cuenta con este correo".to_string(),
        AuthError::WeakPassword(msg) => msg.clone(),
        AuthError::InvalidEmail(_) => "El correo no es válido".to_string(),
        AuthError::MissingField(field) => format!("Falta completar: {field}"),
        AuthError::InvalidToken => "El enlace no es válido o ya expiró".to_string(),
        AuthError::Repository(_) | AuthError::PasswordHash => {
            "Error interno del servidor".to_string()
        }
    }
}

/// Buyer-facing text for a cart problem.
#[must_use]
pub fn pricing_message(err: &PricingError) -> String {
    match err {
        PricingError::UnknownProduct(_) => "El producto no existe".to_string(),
        PricingError::QuantityTooLarge { max, .. } => {
            format!("La cantidad máxima por producto es {max}")
        }
        PricingError::Empty => "El carrito está vacío".to_string(),
        PricingError::BelowMinimum { min, actual } => {
            format!("El pedido mínimo es de {min} unidades (llevas {actual})")
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.user_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("pedido 12".to_string());
        assert_eq!(err.to_string(), "Not found: pedido 12");

        let err = AppError::BadRequest("latitud inválida".to_string());
        assert_eq!(err.to_string(), "Bad request: latitud inválida");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::EmailTaken)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Pricing(PricingError::Empty)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "order 7 payload".to_string(),
        ));
        assert_eq!(err.user_message(), "Error interno del servidor");

        let err = AppError::Internal("smtp relay timeout".to_string());
        assert!(!err.user_message().contains("smtp"));
    }

    #[test]
    fn test_pricing_message_mentions_minimum() {
        let msg = pricing_message(&PricingError::BelowMinimum { min: 6, actual: 4 });
        assert_eq!(msg, "El pedido mínimo es de 6 unidades (llevas 4)");
    }
}
