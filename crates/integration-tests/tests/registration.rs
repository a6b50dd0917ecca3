//! End-to-end tests for registration and password authentication.

#![allow(clippy::unwrap_used)]

use reqwest::{StatusCode, header::LOCATION};
use serde_json::Value;

use customer_profile::config::RegisterRedirect;
use customer_profile_integration_tests::{MAIN_URL, TestServer};

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;
    let resp = server.client.get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_register_page() {
    let server = TestServer::spawn().await;
    let resp = server
        .client
        .get(server.url("/register"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains(r#"action="/register""#));
    assert!(body.contains(&format!("{MAIN_URL}/login")));
}

#[tokio::test]
async fn test_register_then_duplicate() {
    let server = TestServer::spawn().await;

    let resp = server.register("a@x.com", "p1", "p1").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()[LOCATION].to_str().unwrap(),
        format!("{MAIN_URL}/login")
    );
    assert!(resp.text().await.unwrap().is_empty());

    let resp = server.register("a@x.com", "p2", "p2").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.state.directory().len(), 1);

    // The first password still works, the second never took effect
    let resp = server
        .client
        .post(server.url("/authenticate"))
        .form(&[("user_name", "a@x.com"), ("password", "p2")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_redirects_to_new_profile() {
    let server =
        TestServer::spawn_with(|config| config.register_redirect = RegisterRedirect::Profile)
            .await;

    let resp = server.register("a@x.com", "p1", "p1").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[LOCATION], "/profile/2");

    let resp = server.register("b@x.com", "p1", "p1").await;
    assert_eq!(resp.headers()[LOCATION], "/profile/3");
}

#[tokio::test]
async fn test_register_mismatch() {
    let server = TestServer::spawn().await;

    let resp = server.register("a@x.com", "p1", "p2").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Passwords do not match"));
    assert!(server.state.directory().is_empty());
}

#[tokio::test]
async fn test_authenticate_success() {
    let server = TestServer::spawn().await;
    server.register("a@x.com", "p1", "p1").await;

    let resp = server
        .client
        .post(server.url("/authenticate"))
        .json(&serde_json::json!({"user_name": "a@x.com", "password": "p1"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["profile_url"], server.url("/profile/2"));
    assert_eq!(json["user"]["id"], 2);
    assert_eq!(json["user"]["user_name"], "a@x.com");
    assert!(json["user"].get("password").is_none());
}

#[tokio::test]
async fn test_authenticate_failures() {
    let server = TestServer::spawn().await;
    server.register("a@x.com", "p1", "p1").await;

    for (user_name, password) in [("a@x.com", "wrong"), ("nobody@x.com", "p1")] {
        let resp = server
            .client
            .post(server.url("/authenticate"))
            .form(&[("user_name", user_name), ("password", password)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.text().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_concurrent_registrations_single_winner() {
    let server = TestServer::spawn().await;

    let mut set = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let client = server.client.clone();
        let url = server.url("/register");
        set.spawn(async move {
            client
                .post(url)
                .form(&[
                    ("email", "race@x.com"),
                    ("password", "p1"),
                    ("repeated_password", "p1"),
                ])
                .send()
                .await
                .unwrap()
                .status()
        });
    }
    let statuses = set.join_all().await;

    let winners = statuses
        .iter()
        .filter(|s| **s == StatusCode::SEE_OTHER)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(server.state.directory().len(), 1);
}
