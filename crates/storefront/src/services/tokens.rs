//! Single-use tokens for email links.
//!
//! Tokens are 256 random bits, URL-safe base64 encoded. The database keeps
//! only their SHA-256 hex digest.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::TimeDelta;
use rand::RngCore;
use sha2::{Digest, Sha256};

use delicias_core::TokenPurpose;

/// Generate a new raw token for an email link.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest stored in place of the raw token.
#[must_use]
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.trim().as_bytes()))
}

/// How long a token stays valid.
#[must_use]
pub fn lifetime(purpose: TokenPurpose) -> TimeDelta {
    match purpose {
        TokenPurpose::VerifyEmail => TimeDelta::hours(48),
        TokenPurpose::PasswordReset => TimeDelta::hours(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_hash_is_stable_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_token("abc"), hash_token(" abc\n"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn test_reset_tokens_expire_sooner() {
        assert!(lifetime(TokenPurpose::PasswordReset) < lifetime(TokenPurpose::VerifyEmail));
    }
}
