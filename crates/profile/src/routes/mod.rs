//! HTTP route handlers for the profile service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Registration
//! GET  /register               - Register page
//! POST /register               - Register action
//!
//! # Authentication (called by the main site)
//! POST /authenticate           - Verify user name and password
//!
//! # Profile
//! GET  /profile/{id}           - Profile view (scope `profile`)
//! POST /profile/{id}           - Profile update (scope `profile`)
//! PUT  /profile/{id}           - Profile update
//! ```

pub mod authenticate;
pub mod profile;
pub mod register;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the service router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/register",
            get(register::register_page).post(register::register),
        )
        .route("/authenticate", post(authenticate::authenticate))
        .route(
            "/profile/{id}",
            get(profile::show)
                .post(profile::update_with_scope)
                .put(profile::update),
        )
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{
            Request, StatusCode,
            header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION},
        },
        response::Response,
    };
    use tower::ServiceExt;

    use customer_profile_core::{CustomerId, Email};

    use crate::config::{ProfileConfig, RegisterRedirect};
    use crate::models::{Claims, Scopes};
    use crate::services::{AuthService, HmacTokenVerifier, Registration};
    use crate::state::AppState;

    const FORM: &str = "application/x-www-form-urlencoded";

    fn state_with(config: ProfileConfig) -> AppState {
        AppState::new(config)
    }

    fn state() -> AppState {
        state_with(ProfileConfig::for_tests())
    }

    fn register_customer(state: &AppState, email: &str, password: &str) -> CustomerId {
        AuthService::new(state.directory())
            .register(&Registration {
                email: email.to_string(),
                password: password.to_string(),
                repeated_password: password.to_string(),
            })
            .unwrap()
            .id
    }

    fn bearer(scope: &str) -> String {
        let exp = chrono::Utc::now().timestamp() + 600;
        let mut claims = Claims::new("user-1", Scopes::parse(scope), exp);
        claims.name = Some("Ada Lovelace".to_string());
        let token = HmacTokenVerifier::new(&ProfileConfig::for_tests().token)
            .issue(&claims)
            .unwrap();
        format!("Bearer {token}")
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        crate::app(state.clone()).oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, FORM)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_profile(id: &str, accept: Option<&str>, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(format!("/profile/{id}"));
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        builder.body(Body::empty()).unwrap()
    }

    // -------------------------------------------------------------------------
    // Health and registration
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_health() {
        let response = send(
            &state(),
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_register_page_links_login() {
        let response = send(
            &state(),
            Request::builder().uri("/register").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("http://127.0.0.1:8081/login"));
        assert!(html.contains(r#"name="repeated_password""#));
    }

    #[tokio::test]
    async fn test_register_redirects_to_login() {
        let state = state();
        let response = send(
            &state,
            post_form(
                "/register",
                "email=a%40x.com&password=p1&repeated_password=p1",
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "http://127.0.0.1:8081/login");
        assert!(body_text(response).await.is_empty());
        assert!(state.directory().exists_for_email("a@x.com"));
        assert_eq!(
            state.directory().find_by_email("a@x.com").unwrap().id,
            CustomerId::new(2)
        );
    }

    #[tokio::test]
    async fn test_register_redirects_to_profile() {
        let mut config = ProfileConfig::for_tests();
        config.register_redirect = RegisterRedirect::Profile;
        let state = state_with(config);

        let response = send(
            &state,
            post_form(
                "/register",
                "email=a%40x.com&password=p1&repeated_password=p1",
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/profile/2");
    }

    #[tokio::test]
    async fn test_register_password_mismatch_keeps_email() {
        let state = state();
        let response = send(
            &state,
            post_form(
                "/register",
                "email=a%40x.com&password=p1&repeated_password=p2",
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Passwords do not match"));
        assert!(html.contains(r#"value="a@x.com""#));
        assert!(state.directory().is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");

        let response = send(
            &state,
            post_form(
                "/register",
                "email=a%40x.com&password=p2&repeated_password=p2",
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_text(response)
                .await
                .contains("An account with this email already exists")
        );
        assert_eq!(state.directory().len(), 1);
    }

    #[tokio::test]
    async fn test_register_missing_field() {
        let state = state();
        let response = send(&state, post_form("/register", "email=a%40x.com")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.directory().is_empty());
    }

    #[tokio::test]
    async fn test_register_json_body() {
        let state = state();
        let response = send(
            &state,
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"email":"a@x.com","password":"p1","repeated_password":"p1"}"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(state.directory().exists_for_email("a@x.com"));
    }

    #[tokio::test]
    async fn test_register_unreadable_body_renders_form() {
        let state = state();

        let response = send(
            &state,
            Request::builder()
                .method("POST")
                .uri("/register")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains(r#"action="/register""#));
        assert!(body.contains("Missing field: email"));

        let response = send(
            &state,
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{broken"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains(r#"action="/register""#));
        assert!(state.directory().is_empty());
    }

    // -------------------------------------------------------------------------
    // Authenticate
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_authenticate_form() {
        let state = state();
        let id = register_customer(&state, "a@x.com", "p1");

        let response = send(
            &state,
            post_form("/authenticate", "user_name=a%40x.com&password=p1"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["profile_url"], "http://127.0.0.1:8091/profile/2");
        assert_eq!(json["user"]["id"], id.as_i32());
        assert_eq!(json["user"]["email"], "a@x.com");
        assert!(json["user"].get("password").is_none());
        assert!(json["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_authenticate_json() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");

        let response = send(
            &state,
            Request::builder()
                .method("POST")
                .uri("/authenticate")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"user_name":"a@x.com","password":"p1"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_authenticate_failures_have_empty_body() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");

        for body in [
            "user_name=a%40x.com&password=wrong",
            "user_name=b%40x.com&password=p1",
        ] {
            let response = send(&state, post_form("/authenticate", body)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert!(body_text(response).await.is_empty());
        }

        let response = send(
            &state,
            Request::builder()
                .method("POST")
                .uri("/authenticate")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{broken"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.is_empty());
    }

    // -------------------------------------------------------------------------
    // Profile view
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_profile_requires_token_and_scope() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");

        let response = send(&state, get_profile("2", None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&state, get_profile("2", None, Some(&bearer("openid")))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&state, get_profile("2", None, Some("Bearer forged"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_json() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");

        let response = send(
            &state,
            get_profile("2", Some("application/json"), Some(&bearer("profile"))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 2, "user_name": "a@x.com", "email": "a@x.com"})
        );
    }

    #[tokio::test]
    async fn test_profile_xml() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");

        let response = send(
            &state,
            get_profile("2", Some("application/xml"), Some(&bearer("profile"))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/xml");
        let xml = body_text(response).await;
        assert!(xml.starts_with("<customer>"));
        assert!(xml.contains("<id>2</id>"));
        assert!(xml.contains("<email>a@x.com</email>"));
    }

    #[tokio::test]
    async fn test_profile_html_shows_claims() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");

        let response = send(&state, get_profile("2", Some("*/*"), Some(&bearer("profile")))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("Signed in as Ada Lovelace"));
        assert!(html.contains(r#"action="/profile/2""#));
    }

    #[tokio::test]
    async fn test_profile_unknown_or_malformed_id_redirects() {
        let state = state();
        let token = bearer("profile");

        for id in ["99", "abc"] {
            let response = send(&state, get_profile(id, None, Some(&token))).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(response.headers()[LOCATION], "/register");
        }
    }

    // -------------------------------------------------------------------------
    // Profile update
    // -------------------------------------------------------------------------

    fn put_form(id: &str, body: &str, accept: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("PUT")
            .uri(format!("/profile/{id}"))
            .header(CONTENT_TYPE, FORM);
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_put_updates_and_redirects() {
        let state = state();
        let id = register_customer(&state, "a@x.com", "p1");

        let response = send(
            &state,
            put_form(
                "2",
                "id=99&first_name=Ada&last_name=Lovelace&gender=f&birthday=1815-12-10&city=London&email=ada%40x.com",
                None,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/profile/2");

        let customer = state.directory().find_by_id(id).unwrap();
        assert_eq!(customer.first_name, "Ada");
        assert_eq!(customer.email, Email::parse("ada@x.com").unwrap());
        assert_eq!(customer.address.as_ref().unwrap().city, "London");
        assert_eq!(customer.user_name, "");
        assert!(state.directory().find_by_id(CustomerId::new(99)).is_err());
    }

    #[tokio::test]
    async fn test_blank_birthday_clears() {
        let state = state();
        let id = register_customer(&state, "a@x.com", "p1");

        send(&state, put_form("2", "birthday=1990-05-17&email=a%40x.com", None)).await;
        assert!(state.directory().find_by_id(id).unwrap().birthday.is_some());

        send(&state, put_form("2", "birthday=&email=a%40x.com", None)).await;
        assert!(state.directory().find_by_id(id).unwrap().birthday.is_none());
    }

    #[tokio::test]
    async fn test_put_errors() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");
        register_customer(&state, "b@x.com", "p1");

        let response = send(&state, put_form("abc", "email=a%40x.com", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("<!DOCTYPE html>"));

        let response = send(
            &state,
            put_form("99", "email=a%40x.com", Some("application/json")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_text(response).await,
            r#"{"error":"Customer not found"}"#
        );

        let response = send(
            &state,
            put_form("2", "email=not-an-email", Some("application/xml")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("<error><message>"));

        let response = send(&state, put_form("3", "email=a%40x.com", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            state.directory().find_by_id(CustomerId::new(3)).unwrap().email,
            Email::parse("b@x.com").unwrap()
        );
    }

    #[tokio::test]
    async fn test_put_cannot_take_over_user_name() {
        let state = state();
        let b = register_customer(&state, "b@x.com", "pb");
        register_customer(&state, "a@x.com", "pa");

        let response = send(
            &state,
            put_form("2", "user_name=a%40x.com&email=b%40x.com", Some("application/json")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            r#"{"error":"This user name is already taken"}"#
        );
        assert_eq!(state.directory().find_by_id(b).unwrap().user_name, "b@x.com");

        let response = send(
            &state,
            post_form("/authenticate", "user_name=a%40x.com&password=pa"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_put_accepts_optional_token() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");

        let mut request = put_form("2", "first_name=Ada&email=a%40x.com", None);
        request
            .headers_mut()
            .insert(AUTHORIZATION, bearer("openid").parse().unwrap());
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let mut request = put_form("2", "first_name=Eve&email=a%40x.com", None);
        request
            .headers_mut()
            .insert(AUTHORIZATION, "Bearer not-a-token".parse().unwrap());
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            state
                .directory()
                .find_by_id(CustomerId::new(2))
                .unwrap()
                .first_name,
            "Ada"
        );
    }

    #[tokio::test]
    async fn test_post_update_requires_scope() {
        let state = state();
        register_customer(&state, "a@x.com", "p1");

        let response = send(&state, post_form("/profile/2", "first_name=Ada&email=a%40x.com")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut request = post_form("/profile/2", "first_name=Ada&email=a%40x.com");
        request
            .headers_mut()
            .insert(AUTHORIZATION, bearer("profile").parse().unwrap());
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            state
                .directory()
                .find_by_id(CustomerId::new(2))
                .unwrap()
                .first_name,
            "Ada"
        );
    }
}
