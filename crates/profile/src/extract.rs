//! Request body extraction.

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::{StatusCode, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

/// Body extractor accepting either a JSON or a form-encoded body.
///
/// `application/json` bodies are parsed as JSON; everything else goes through
/// the form decoder. Any failure rejects with a bare 400.
#[derive(Debug, Clone)]
pub struct FormOrJson<T>(pub T);

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("application/json"))
}

impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let result = if is_json(&request) {
            Json::<T>::from_request(request, state)
                .await
                .map(|Json(value)| value)
                .map_err(|e| e.body_text())
        } else {
            Form::<T>::from_request(request, state)
                .await
                .map(|Form(value)| value)
                .map_err(|e| e.body_text())
        };

        result.map(Self).map_err(|reason| {
            tracing::debug!(%reason, "Rejected request body");
            StatusCode::BAD_REQUEST
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    struct Login {
        user_name: String,
        password: String,
    }

    fn request(content_type: &str, body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    async fn extract(request: Request) -> Result<Login, StatusCode> {
        FormOrJson::<Login>::from_request(request, &())
            .await
            .map(|FormOrJson(login)| login)
    }

    #[tokio::test]
    async fn test_form_body() {
        let login = extract(request(
            "application/x-www-form-urlencoded",
            "user_name=a%40x.com&password=p1",
        ))
        .await
        .unwrap();
        assert_eq!(login.user_name, "a@x.com");
        assert_eq!(login.password, "p1");
    }

    #[tokio::test]
    async fn test_json_body() {
        let login = extract(request(
            "application/json; charset=utf-8",
            r#"{"user_name":"a@x.com","password":"p1"}"#,
        ))
        .await
        .unwrap();
        assert_eq!(login.user_name, "a@x.com");
    }

    #[tokio::test]
    async fn test_bad_bodies_are_400() {
        assert_eq!(
            extract(request("application/json", "{not json")).await,
            Err(StatusCode::BAD_REQUEST)
        );
        assert_eq!(
            extract(request("application/x-www-form-urlencoded", "user_name=a")).await,
            Err(StatusCode::BAD_REQUEST)
        );
        assert_eq!(
            extract(request("text/plain", "hello")).await,
            Err(StatusCode::BAD_REQUEST)
        );
    }
}
