//! Authentication error types.

use thiserror::Error;

use crate::directory::DirectoryError;

/// Errors that can occur during registration and authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required form field was missing or blank.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] customer_profile_core::EmailError),

    /// Password and repeated password differ.
    #[error("password mismatch")]
    PasswordMismatch,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Invalid credentials (wrong password or unknown user name).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Directory error other than a duplicate.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// True for failures caused by the submitted form rather than the server.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_)
                | Self::InvalidEmail(_)
                | Self::PasswordMismatch
                | Self::UserAlreadyExists
        )
    }
}
