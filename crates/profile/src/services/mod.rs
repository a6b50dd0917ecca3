//! Business logic services.

pub mod auth;
pub mod token;

pub use auth::{AuthError, AuthService, Registration};
pub use token::{HmacTokenVerifier, TokenError, TokenVerifier};
