//! Token verification error types.

use thiserror::Error;

/// Reasons a bearer token is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not three base64url segments, or a segment is not valid JSON.
    #[error("malformed token")]
    Malformed,

    /// The header names an algorithm other than HS256.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature does not match.
    #[error("invalid signature")]
    InvalidSignature,

    /// `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// `nbf` is in the future.
    #[error("token not yet valid")]
    NotYetValid,

    /// `iss` differs from the configured issuer.
    #[error("unexpected issuer")]
    IssuerMismatch,

    /// The signing key could not be used or claims could not be encoded.
    #[error("token signing error: {0}")]
    Signing(String),
}
