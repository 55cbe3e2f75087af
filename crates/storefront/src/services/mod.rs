//! Business logic services for the storefront.
//!
//! - `auth` - Registration, login, email verification and password reset
//! - `email` - Transactional email over SMTP
//! - `tokens` - Single-use token generation and hashing

pub mod auth;
pub mod email;
pub mod tokens;

pub use auth::{AuthError, AuthService, Registration};
pub use email::{EmailError, EmailService};
