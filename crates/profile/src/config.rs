//! Profile service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PROFILE_TOKEN_SECRET` - HMAC key for bearer tokens (min 32 chars, high entropy)
//!
//! ## Optional
//! - `PROFILE_HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8090)
//! - `LOGIN_URL` - Login page linked from the register page (default: <http://127.0.0.1:8081/login>)
//! - `OWN_URL` - Public base URL of this service (default: <http://127.0.0.1:8091>)
//! - `MAIN_URL` - Base URL of the main site (default: <http://127.0.0.1:8081>)
//! - `REGISTER_REDIRECT` - Where to send new customers: `login` or `profile` (default: login)
//! - `PROFILE_TOKEN_ISSUER` - Required `iss` claim of bearer tokens
//! - `TLS_KEY` / `TLS_CERT` - PEM key and certificate file paths
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where a successful registration redirects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterRedirect {
    /// `{main_url}/login`
    #[default]
    Login,
    /// `/profile/{id}` of the new customer
    Profile,
}

impl FromStr for RegisterRedirect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "login" => Ok(Self::Login),
            "profile" => Ok(Self::Profile),
            other => Err(format!("expected `login` or `profile`, got `{other}`")),
        }
    }
}

/// Profile service configuration.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Login page linked from the registration form
    pub login_url: String,
    /// Public base URL of this service (used for `profile_url`)
    pub own_url: String,
    /// Base URL of the main site
    pub main_url: String,
    /// Redirect target after registration
    pub register_redirect: RegisterRedirect,
    /// Bearer token verification settings
    pub token: TokenConfig,
    /// TLS key and certificate paths, or the reason TLS is not available
    pub tls: Result<TlsConfig, TlsUnavailable>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Bearer token settings.
///
/// Implements `Debug` manually to redact the signing key.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC-SHA256 key shared with the token issuer
    pub secret: SecretString,
    /// Expected `iss` claim, if any
    pub issuer: Option<String>,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenConfig {
    /// Load token settings on their own (used by tooling that never binds a socket).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the secret is missing or fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let secret = get_validated_secret("PROFILE_TOKEN_SECRET")?;
        let issuer = get_optional_env("PROFILE_TOKEN_ISSUER");
        Ok(Self { secret, issuer })
    }
}

/// TLS key and certificate file locations.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// PEM-encoded private key file
    pub key_file: PathBuf,
    /// PEM-encoded certificate chain file
    pub cert_file: PathBuf,
}

/// Reason TLS settings could not be used; the server then serves plain HTTP.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TlsUnavailable {
    #[error("no TLS key configured")]
    NoKey,
    #[error("configured TLS key not available")]
    KeyMissing,
    #[error("no TLS cert configured")]
    NoCert,
    #[error("configured TLS cert not available")]
    CertMissing,
}

impl TlsConfig {
    /// Resolve TLS settings from `TLS_KEY` and `TLS_CERT`.
    ///
    /// # Errors
    ///
    /// Returns the first reason TLS cannot be enabled.
    pub fn from_env() -> Result<Self, TlsUnavailable> {
        Self::from_paths(get_optional_env("TLS_KEY"), get_optional_env("TLS_CERT"))
    }

    fn from_paths(key: Option<String>, cert: Option<String>) -> Result<Self, TlsUnavailable> {
        let key_file = key
            .filter(|k| !k.is_empty())
            .map(PathBuf::from)
            .ok_or(TlsUnavailable::NoKey)?;
        if !key_file.exists() {
            return Err(TlsUnavailable::KeyMissing);
        }

        let cert_file = cert
            .filter(|c| !c.is_empty())
            .map(PathBuf::from)
            .ok_or(TlsUnavailable::NoCert)?;
        if !cert_file.exists() {
            return Err(TlsUnavailable::CertMissing);
        }

        Ok(Self {
            key_file,
            cert_file,
        })
    }
}

impl ProfileConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present. Missing or
    /// unusable TLS settings are not an error; the reason is kept in `tls` and
    /// the service falls back to plain HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the token secret fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("PROFILE_HOST", "0.0.0.0")?;
        let port = parse_env("PORT", "8090")?;
        let login_url = get_url("LOGIN_URL", "http://127.0.0.1:8081/login")?;
        let own_url = get_url("OWN_URL", "http://127.0.0.1:8091")?;
        let main_url = get_url("MAIN_URL", "http://127.0.0.1:8081")?;
        let register_redirect = parse_env("REGISTER_REDIRECT", "login")?;
        let token = TokenConfig::from_env()?;

        Ok(Self {
            host,
            port,
            login_url,
            own_url,
            main_url,
            register_redirect,
            token,
            tls: TlsConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL of a customer's profile page.
    #[must_use]
    pub fn profile_url(&self, id: impl std::fmt::Display) -> String {
        format!("{}/profile/{id}", self.own_url)
    }

    /// Absolute URL of the main site's login page.
    #[must_use]
    pub fn main_login_url(&self) -> String {
        format!("{}/login", self.main_url)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an absolute URL, normalized without a trailing slash.
fn get_url(key: &str, default: &str) -> Result<String, ConfigError> {
    normalize_url(&get_env_or_default(key, default))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

fn normalize_url(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is long enough, not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
impl ProfileConfig {
    /// Local settings with a fixed token key, for router tests.
    pub(crate) fn for_tests() -> Self {
        Self {
            host: std::net::Ipv4Addr::LOCALHOST.into(),
            port: 8090,
            login_url: "http://127.0.0.1:8081/login".to_string(),
            own_url: "http://127.0.0.1:8091".to_string(),
            main_url: "http://127.0.0.1:8081".to_string(),
            register_redirect: RegisterRedirect::Login,
            token: TokenConfig {
                secret: SecretString::from("k7#Qz!9vL2@xR4$mN8^pT1&wY6*cB3%d"),
                issuer: None,
            },
            tls: Err(TlsUnavailable::NoKey),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}
