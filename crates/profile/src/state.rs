//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ProfileConfig;
use crate::directory::CustomerDirectory;
use crate::services::{HmacTokenVerifier, TokenVerifier};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Owns the customer directory, so the
/// directory lives exactly as long as the router serving it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ProfileConfig,
    directory: CustomerDirectory,
    verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Create state with an empty directory and an HS256 verifier built from
    /// `config.token`.
    #[must_use]
    pub fn new(config: ProfileConfig) -> Self {
        let verifier = Arc::new(HmacTokenVerifier::new(&config.token));
        Self::with_verifier(config, verifier)
    }

    /// Create state with a custom token verifier.
    #[must_use]
    pub fn with_verifier(config: ProfileConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                directory: CustomerDirectory::new(),
                verifier,
            }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &ProfileConfig {
        &self.inner.config
    }

    /// Get a reference to the customer directory.
    #[must_use]
    pub fn directory(&self) -> &CustomerDirectory {
        &self.inner.directory
    }

    /// Get a reference to the bearer token verifier.
    #[must_use]
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.inner.verifier.as_ref()
    }
}
