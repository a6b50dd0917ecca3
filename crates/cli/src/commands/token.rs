//! Bearer token commands.
//!
//! # Usage
//!
//! ```bash
//! # Mint a token with the `profile` scope, valid for an hour
//! profile-cli token issue --sub user-1 --name "Ada Lovelace"
//!
//! # Verify a token and show its claims
//! profile-cli token inspect eyJhbGciOi...
//! ```
//!
//! # Environment Variables
//!
//! - `PROFILE_TOKEN_SECRET` - HMAC key shared with the profile service
//! - `PROFILE_TOKEN_ISSUER` - Written to and required as the `iss` claim

use clap::Args;
use thiserror::Error;

use customer_profile::config::{ConfigError, TokenConfig};
use customer_profile::models::{Claims, Scopes};
use customer_profile::services::{HmacTokenVerifier, TokenError, TokenVerifier};

/// Errors that can occur during token commands.
#[derive(Debug, Error)]
pub enum TokenCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Invalid lifetime: {0} minutes")]
    InvalidTtl(i64),

    #[error("Could not render claims: {0}")]
    Json(#[from] serde_json::Error),
}

/// Arguments of `token issue`.
#[derive(Debug, Args)]
pub struct IssueArgs {
    /// Subject identifier
    #[arg(long)]
    pub sub: String,

    /// Space-delimited scopes
    #[arg(long, default_value = "profile")]
    pub scope: String,

    /// Display name claim
    #[arg(long)]
    pub name: Option<String>,

    /// Email claim
    #[arg(long)]
    pub email: Option<String>,

    /// Lifetime in minutes
    #[arg(long, default_value_t = 60)]
    pub ttl_minutes: i64,
}

/// Build the claims for `args`, issued at `now` (Unix seconds).
fn claims_for(args: &IssueArgs, issuer: Option<String>, now: i64) -> Result<Claims, TokenCommandError> {
    if args.ttl_minutes <= 0 {
        return Err(TokenCommandError::InvalidTtl(args.ttl_minutes));
    }
    let exp = args
        .ttl_minutes
        .checked_mul(60)
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or(TokenCommandError::InvalidTtl(args.ttl_minutes))?;

    let mut claims = Claims::new(args.sub.clone(), Scopes::parse(&args.scope), exp);
    claims.name.clone_from(&args.name);
    claims.email.clone_from(&args.email);
    claims.iss = issuer;
    claims.iat = Some(now);
    Ok(claims)
}

/// Sign a token with the given settings.
///
/// # Errors
///
/// Returns an error if the lifetime is not positive or signing fails.
pub fn issue_with(config: &TokenConfig, args: &IssueArgs) -> Result<String, TokenCommandError> {
    let claims = claims_for(args, config.issuer.clone(), chrono::Utc::now().timestamp())?;
    let token = HmacTokenVerifier::new(config).issue(&claims)?;

    tracing::info!(sub = %claims.sub, scope = %claims.scope, exp = claims.exp, "Token issued");
    Ok(token)
}

/// Verify a token and render its claims as pretty JSON.
///
/// # Errors
///
/// Returns an error if the token does not verify.
pub fn inspect_with(config: &TokenConfig, token: &str) -> Result<String, TokenCommandError> {
    let claims = HmacTokenVerifier::new(config).verify(token.trim())?;
    Ok(serde_json::to_string_pretty(&claims)?)
}

/// `token issue` using settings from the environment.
///
/// # Errors
///
/// Returns an error if the settings are missing or signing fails.
pub fn issue(args: &IssueArgs) -> Result<String, TokenCommandError> {
    issue_with(&TokenConfig::from_env()?, args)
}

/// `token inspect` using settings from the environment.
///
/// # Errors
///
/// Returns an error if the settings are missing or the token is rejected.
pub fn inspect(token: &str) -> Result<String, TokenCommandError> {
    inspect_with(&TokenConfig::from_env()?, token)
}
