//! Bearer token authorization.
//!
//! [`authorize`] runs on every request. A request without an `Authorization`
//! header passes through anonymously; a valid bearer token attaches
//! [`VerifiedClaims`] to the request extensions; anything else is rejected
//! with 401 before a handler runs. Handlers then state their requirement with
//! the [`RequireScope`] or [`OptionalClaims`] extractors.

use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderValue, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::models::VerifiedClaims;
use crate::state::AppState;

/// A scope a route demands.
pub trait RequiredScope {
    const SCOPE: &'static str;
}

/// The `profile` scope guarding profile views and edits.
#[derive(Debug, Clone, Copy)]
pub struct ProfileScope;

impl RequiredScope for ProfileScope {
    const SCOPE: &'static str = "profile";
}

/// Rejection produced by the authorization layer and its extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimsRejection {
    /// The `Authorization` header is not a verifiable bearer token.
    InvalidToken,
    /// The route requires a token and none was sent.
    MissingToken,
    /// The token lacks the scope the route requires.
    InsufficientScope(&'static str),
}

impl IntoResponse for ClaimsRejection {
    fn into_response(self) -> Response {
        let (status, challenge) = match self {
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                r#"Bearer error="invalid_token""#.to_string(),
            ),
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Bearer".to_string()),
            Self::InsufficientScope(scope) => (
                StatusCode::FORBIDDEN,
                format!(r#"Bearer error="insufficient_scope", scope="{scope}""#),
            ),
        };

        let mut response = status.into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
fn bearer_token(value: &HeaderValue) -> Option<&str> {
    let (scheme, token) = value.to_str().ok()?.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware that verifies bearer tokens and attaches their claims.
pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return next.run(request).await;
    };

    let Some(token) = bearer_token(header) else {
        tracing::warn!("Authorization header is not a bearer token");
        return ClaimsRejection::InvalidToken.into_response();
    };

    match state.verifier().verify(token) {
        Ok(claims) => {
            tracing::debug!(sub = %claims.sub, scope = %claims.scope, "Bearer token verified");
            request
                .extensions_mut()
                .insert(VerifiedClaims::new(claims));
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Bearer token rejected");
            ClaimsRejection::InvalidToken.into_response()
        }
    }
}

/// Extractor that requires verified claims carrying scope `S`.
///
/// No claims yields 401; claims without the scope yield 403.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireScope(claims, _): RequireScope<ProfileScope>) -> impl IntoResponse {
///     format!("Hello, {}!", claims.claims().display_name())
/// }
/// ```
pub struct RequireScope<S>(pub VerifiedClaims, pub PhantomData<S>);

impl<S, St> FromRequestParts<St> for RequireScope<S>
where
    S: RequiredScope,
    St: Send + Sync,
{
    type Rejection = ClaimsRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<VerifiedClaims>()
            .cloned()
            .ok_or(ClaimsRejection::MissingToken)?;

        if !claims.has_scope(S::SCOPE) {
            tracing::info!(sub = %claims.claims().sub, scope = S::SCOPE, "Token lacks required scope");
            return Err(ClaimsRejection::InsufficientScope(S::SCOPE));
        }

        Ok(Self(claims, PhantomData))
    }
}

/// Extractor that gets verified claims if the request carried a token.
pub struct OptionalClaims(pub Option<VerifiedClaims>);

impl<St> FromRequestParts<St> for OptionalClaims
where
    St: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<VerifiedClaims>().cloned()))
    }
}
