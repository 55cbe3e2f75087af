//! Buyer authentication extractors.
//!
//! The session only remembers *who* is logged in. Whether they may use the
//! wholesale portal is read from the database on every gated request, so an
//! admin decision applies on the buyer's next click.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::ProfileRepository;
use crate::models::{CurrentBuyer, PortalAccess, Profile, session_keys};
use crate::state::AppState;

/// Where buyers without portal access are sent.
pub const PENDING_PATH: &str = "/mayorista/pendiente";

/// Extractor that requires a logged-in buyer, whatever their approval state.
pub struct RequireBuyer(pub CurrentBuyer);

/// Extractor that requires a verified, approved buyer.
///
/// Carries the freshly loaded profile.
///
/// ```rust,ignore
/// async fn portal(RequireApprovedBuyer(profile): RequireApprovedBuyer) -> impl IntoResponse {
///     format!("Hola, {}", profile.business.business_name)
/// }
/// ```
pub struct RequireApprovedBuyer(pub Profile);

/// Extractor that optionally gets the current buyer.
pub struct OptionalBuyer(pub Option<CurrentBuyer>);

/// Why a gated request was turned away.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in (HTML requests).
    RedirectToLogin,
    /// Not logged in (API requests).
    Unauthorized,
    /// Logged in, but unverified, pending or rejected.
    NotApproved,
    /// Approval lookup failed.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::NotApproved => Redirect::to(PENDING_PATH).into_response(),
            Self::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

fn anonymous_rejection(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

async fn session_buyer(parts: &Parts) -> Option<CurrentBuyer> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentBuyer>(session_keys::CURRENT_BUYER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireBuyer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_buyer(parts)
            .await
            .map(Self)
            .ok_or_else(|| anonymous_rejection(parts))
    }
}

impl FromRequestParts<AppState> for RequireApprovedBuyer {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let buyer = session_buyer(parts)
            .await
            .ok_or_else(|| anonymous_rejection(parts))?;

        let profile = ProfileRepository::new(state.pool())
            .get_by_id(buyer.id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, profile_id = %buyer.id, "Failed to load buyer profile");
                AuthRejection::Internal
            })?
            // Profile deleted since login: treat as logged out.
            .ok_or_else(|| anonymous_rejection(parts))?;

        match profile.access() {
            PortalAccess::Granted => Ok(Self(profile)),
            _ => Err(AuthRejection::NotApproved),
        }
    }
}

impl<S> FromRequestParts<S> for OptionalBuyer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_buyer(parts).await))
    }
}

/// Store the logged-in buyer, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_buyer(
    session: &Session,
    buyer: &CurrentBuyer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_BUYER, buyer).await
}

/// Forget the logged-in buyer and everything else in the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_buyer(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
