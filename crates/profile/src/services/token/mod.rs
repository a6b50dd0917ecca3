//! Bearer token verification.
//!
//! The service does not run an OAuth2 flow itself. It accepts compact JWS
//! tokens (`header.payload.signature`, base64url without padding) signed with
//! HMAC-SHA256 by an identity provider that shares `PROFILE_TOKEN_SECRET`.
//! The verifier sits behind the [`TokenVerifier`] trait so another scheme can
//! be plugged into the authorization middleware.

mod error;

pub use error::TokenError;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::TokenConfig;
use crate::models::Claims;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Verifies a raw bearer token and returns its claims.
pub trait TokenVerifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `TokenError` if the token is malformed, forged, expired or
    /// issued by someone else.
    fn verify(&self, token: &str) -> Result<Claims, TokenError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// HS256 token verifier and issuer.
///
/// Implements `Debug` manually to redact the key.
pub struct HmacTokenVerifier {
    key: SecretString,
    issuer: Option<String>,
}

impl std::fmt::Debug for HmacTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacTokenVerifier")
            .field("key", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl HmacTokenVerifier {
    /// Create a verifier from token settings.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            key: config.secret.clone(),
            issuer: config.issuer.clone(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Sign `claims` into a compact token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the claims cannot be encoded.
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };
        let header = serde_json::to_vec(&header).map_err(|e| TokenError::Signing(e.to_string()))?;
        let payload = serde_json::to_vec(claims).map_err(|e| TokenError::Signing(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify `token` against the clock value `now` (Unix seconds).
    fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let signed_len = token.len() - signature_segment_len(token);
        let mut mac = self.mac()?;
        mac.update(token.as_bytes().get(..signed_len).ok_or(TokenError::Malformed)?);
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = decode_segment(payload)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        if claims.nbf.is_some_and(|nbf| nbf > now) {
            return Err(TokenError::NotYetValid);
        }
        if let Some(expected) = &self.issuer
            && claims.iss.as_ref() != Some(expected)
        {
            return Err(TokenError::IssuerMismatch);
        }

        Ok(claims)
    }
}

impl TokenVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }
}

/// Length of the signature segment including its leading dot.
fn signature_segment_len(token: &str) -> usize {
    token.rfind('.').map_or(0, |dot| token.len() - dot)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
