//! End-to-end test harness for the customer profile service.
//!
//! Each test spawns the real router on an ephemeral localhost port and talks
//! to it over HTTP with `reqwest`. Redirects are not followed so tests can
//! assert on `303 See Other` responses.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p customer-profile-integration-tests
//! ```

use reqwest::{Client, redirect::Policy};
use secrecy::SecretString;
use tokio::net::TcpListener;

use customer_profile::config::{ProfileConfig, RegisterRedirect, TlsUnavailable, TokenConfig};
use customer_profile::models::{Claims, Scopes};
use customer_profile::services::HmacTokenVerifier;
use customer_profile::state::AppState;

/// Token key shared by the test server and [`TestServer::bearer`].
const TEST_TOKEN_SECRET: &str = "k7#Qz!9vL2@xR4$mN8^pT1&wY6*cB3%d";

/// Main site base URL the test server redirects to after registration.
pub const MAIN_URL: &str = "http://main.test";

/// A profile service listening on localhost.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub client: Client,
    token: TokenConfig,
}

impl TestServer {
    /// Spawn with default settings.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn after letting `configure` adjust the settings.
    pub async fn spawn_with(configure: impl FnOnce(&mut ProfileConfig)) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let base_url = format!("http://{addr}");

        let token = TokenConfig {
            secret: SecretString::from(TEST_TOKEN_SECRET),
            issuer: None,
        };
        let mut config = ProfileConfig {
            host: addr.ip(),
            port: addr.port(),
            login_url: format!("{MAIN_URL}/login"),
            own_url: base_url.clone(),
            main_url: MAIN_URL.to_string(),
            register_redirect: RegisterRedirect::Login,
            token: token.clone(),
            tls: Err(TlsUnavailable::NoKey),
            sentry_dsn: None,
            sentry_environment: None,
        };
        configure(&mut config);

        let state = AppState::new(config);
        let app = customer_profile::app(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            state,
            client,
            token,
        }
    }

    /// Absolute URL of `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// An `Authorization` value carrying a fresh token with `scope`.
    #[must_use]
    pub fn bearer(&self, scope: &str) -> String {
        let exp = chrono::Utc::now().timestamp() + 600;
        let mut claims = Claims::new("user-1", Scopes::parse(scope), exp);
        claims.name = Some("Ada Lovelace".to_string());
        let token = HmacTokenVerifier::new(&self.token)
            .issue(&claims)
            .expect("Failed to sign test token");
        format!("Bearer {token}")
    }

    /// Submit the registration form.
    pub async fn register(&self, email: &str, password: &str, repeated: &str) -> reqwest::Response {
        self.client
            .post(self.url("/register"))
            .form(&[
                ("email", email),
                ("password", password),
                ("repeated_password", repeated),
            ])
            .send()
            .await
            .expect("Register request failed")
    }
}
