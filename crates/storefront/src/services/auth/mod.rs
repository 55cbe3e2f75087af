//! Buyer authentication.
//!
//! Password login with Argon2id hashes, plus the email-token flows for
//! address verification and password reset. Portal approval is not decided
//! here; see [`crate::middleware::RequireApprovedBuyer`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sqlx::PgPool;

use delicias_core::{Email, ProfileId, TokenPurpose};

use crate::db::{EmailTokenRepository, ProfileRepository, RepositoryError};
use crate::models::{BusinessDetails, NewProfile, Profile};
use crate::services::tokens;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (bounds hashing cost).
const MAX_PASSWORD_LENGTH: usize = 128;

/// Registration input, already split from the form.
#[derive(Debug)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub business: BusinessDetails,
}

/// Authentication service.
pub struct AuthService<'a> {
    profiles: ProfileRepository<'a>,
    tokens: EmailTokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool),
            tokens: EmailTokenRepository::new(pool),
        }
    }

    /// Register a business account.
    ///
    /// The profile starts unverified and pending approval. Returns the profile
    /// and the raw email verification token to send.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail`, `WeakPassword` or `MissingField` for bad input,
    /// and `EmailTaken` if the address is already registered.
    pub async fn register(
        &self,
        registration: Registration<'_>,
    ) -> Result<(Profile, String), AuthError> {
        let email = Email::parse(registration.email)?;
        validate_password(registration.password)?;
        let business = validate_business(registration.business)?;
        let password_hash = hash_password(registration.password)?;

        let profile = self
            .profiles
            .create(&NewProfile {
                email,
                password_hash,
                business,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        let token = self.issue(profile.id, TokenPurpose::VerifyEmail).await?;
        Ok((profile, token))
    }

    /// Confirm an email address from a verification link.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` if the token is unknown, expired or used.
    pub async fn verify_email(&self, raw_token: &str) -> Result<ProfileId, AuthError> {
        let profile_id = self
            .tokens
            .consume(TokenPurpose::VerifyEmail, &tokens::hash_token(raw_token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.profiles.mark_email_verified(profile_id).await?;
        Ok(profile_id)
    }

    /// Issue a fresh verification link for a logged-in buyer.
    ///
    /// Earlier links stop working. Returns `None` when the address is
    /// already verified.
    ///
    /// # Errors
    ///
    /// Returns `Repository(NotFound)` if the profile no longer exists.
    pub async fn resend_verification(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<(Profile, String)>, AuthError> {
        let profile = self
            .profiles
            .get_by_id(profile_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if profile.email_verified {
            return Ok(None);
        }

        let token = self.issue(profile.id, TokenPurpose::VerifyEmail).await?;
        Ok(Some((profile, token)))
    }

    /// Check an email and password.
    ///
    /// Succeeds for any approval state; the portal gate decides access.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown email or wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (profile, password_hash) = self
            .profiles
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(profile)
    }

    /// Start a password reset.
    ///
    /// Returns `None` when no account uses the address, so callers can answer
    /// identically either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(Profile, String)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        let Some(profile) = self.profiles.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = self.issue(profile.id, TokenPurpose::PasswordReset).await?;
        Ok(Some((profile, token)))
    }

    /// Whether a reset link is still usable, for rendering the form.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database fails.
    pub async fn is_reset_token_live(&self, raw_token: &str) -> Result<bool, AuthError> {
        Ok(self
            .tokens
            .is_live(TokenPurpose::PasswordReset, &tokens::hash_token(raw_token))
            .await?)
    }

    /// Set a new password from a reset link.
    ///
    /// Completing a reset also marks the email verified.
    ///
    /// # Errors
    ///
    /// Returns `WeakPassword` for a bad password and `InvalidToken` if the
    /// link is no longer valid.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<ProfileId, AuthError> {
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;

        let profile_id = self
            .tokens
            .consume(TokenPurpose::PasswordReset, &tokens::hash_token(raw_token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.profiles
            .update_password(profile_id, &password_hash)
            .await?;
        self.profiles.mark_email_verified(profile_id).await?;
        Ok(profile_id)
    }

    async fn issue(&self, profile_id: ProfileId, purpose: TokenPurpose) -> Result<String, AuthError> {
        let raw = tokens::generate_token();
        let expires_at = Utc::now() + tokens::lifetime(purpose);
        self.tokens
            .issue(profile_id, purpose, &tokens::hash_token(&raw), expires_at)
            .await?;
        Ok(raw)
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LENGTH} caracteres"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "La contraseña no puede superar {MAX_PASSWORD_LENGTH} caracteres"
        )));
    }
    Ok(())
}

/// Trim every business field and reject blanks.
fn validate_business(business: BusinessDetails) -> Result<BusinessDetails, AuthError> {
    fn required(value: String, field: &'static str) -> Result<String, AuthError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AuthError::MissingField(field));
        }
        Ok(trimmed.to_owned())
    }

    Ok(BusinessDetails {
        business_name: required(business.business_name, "razón social")?,
        rut: required(business.rut, "RUT")?,
        contact_name: required(business.contact_name, "nombre de contacto")?,
        phone: required(business.phone, "teléfono")?,
        address: required(business.address, "dirección")?,
        comuna: required(business.comuna, "comuna")?,
        city: required(business.city, "ciudad")?,
    })
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn business() -> BusinessDetails {
        BusinessDetails {
            business_name: "  Panadería San Camilo ".to_owned(),
            rut: "77.555.444-3".to_owned(),
            contact_name: "Camila Rojas".to_owned(),
            phone: "+56 2 2345 6789".to_owned(),
            address: "San Camilo 120".to_owned(),
            comuna: "Santiago".to_owned(),
            city: "Santiago".to_owned(),
        }
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("exactly8").is_ok());
        assert!(validate_password(&"a".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_password_counts_characters() {
        assert!(validate_password("contraseña").is_ok());
        // 7 characters, 14 bytes.
        assert!(validate_password("ñññññññ").is_err());
    }

    #[test]
    fn test_validate_business_trims_and_requires_fields() {
        let ok = validate_business(business()).unwrap();
        assert_eq!(ok.business_name, "Panadería San Camilo");

        let mut missing = business();
        missing.comuna = "   ".to_owned();
        assert!(matches!(
            validate_business(missing),
            Err(AuthError::MissingField("comuna"))
        ));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("manjar-y-coco").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("manjar-y-coco", &hash).is_ok());
        assert!(matches!(
            verify_password("otra-cosa", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AuthError::PasswordHash)
        ));
    }
}
