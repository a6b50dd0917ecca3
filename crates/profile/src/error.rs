//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the client sees a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::directory::DirectoryError;
use crate::models::ProfileError;
use crate::services::{AuthError, TokenError};

/// Application-level error type for the profile service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Directory operation failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Registration or authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Submitted profile fields are invalid.
    #[error("Invalid profile: {0}")]
    Profile(#[from] ProfileError),

    /// Bearer token rejected.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request carries no usable identity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Identity lacks a required scope.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Directory(err) => match err {
                DirectoryError::NotFound => StatusCode::NOT_FOUND,
                DirectoryError::EmailTaken | DirectoryError::UserNameTaken => {
                    StatusCode::BAD_REQUEST
                }
                DirectoryError::IdsExhausted => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::MissingField(_)
                | AuthError::InvalidEmail(_)
                | AuthError::PasswordMismatch
                | AuthError::UserAlreadyExists => StatusCode::BAD_REQUEST,
                AuthError::Directory(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Profile(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Token(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Directory(DirectoryError::EmailTaken) => {
                "An account with this email already exists".to_string()
            }
            Self::Directory(DirectoryError::UserNameTaken) => {
                "This user name is already taken".to_string()
            }
            Self::Directory(DirectoryError::NotFound) => "Customer not found".to_string(),
            Self::Auth(err) => match err {
                AuthError::MissingField(field) => format!("Missing field: {field}"),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::PasswordMismatch => "Passwords do not match".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::Directory(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Profile(err) => err.to_string(),
            Self::Token(_) => "Invalid token".to_string(),
            Self::Directory(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a customer ID.
///
/// Call this after successful authentication to associate errors with customers.
pub fn set_sentry_user(customer_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for customer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
