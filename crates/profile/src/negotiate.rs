//! Response content negotiation.
//!
//! The `Accept` header is matched exactly: `application/json` and
//! `application/xml` select a structured payload, everything else (including
//! no header, wildcards and parameters) selects the HTML page.

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap, StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
        request::Parts,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

const APPLICATION_JSON: &str = "application/json";
const APPLICATION_XML: &str = "application/xml";

/// Serialization chosen for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Html,
    Json,
    Xml,
}

impl ResponseFormat {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(ACCEPT).and_then(|v| v.to_str().ok()) {
            Some(APPLICATION_JSON) => Self::Json,
            Some(APPLICATION_XML) => Self::Xml,
            _ => Self::Html,
        }
    }
}

impl<S> FromRequestParts<S> for ResponseFormat
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Render `payload` as JSON or XML, or `page` for HTML.
///
/// JSON carries the payload object itself; XML wraps it in an element named
/// `key`.
///
/// # Errors
///
/// Returns `AppError::Internal` if the payload cannot be serialized.
pub fn negotiate<P, H>(
    status: StatusCode,
    format: ResponseFormat,
    key: &str,
    payload: &P,
    page: H,
) -> Result<Response, AppError>
where
    P: Serialize + ?Sized,
    H: IntoResponse,
{
    match format {
        ResponseFormat::Json => {
            let body = serde_json::to_string(payload)
                .map_err(|e| AppError::Internal(format!("JSON serialization failed: {e}")))?;
            Ok((status, [(CONTENT_TYPE, APPLICATION_JSON)], body).into_response())
        }
        ResponseFormat::Xml => {
            let body = quick_xml::se::to_string_with_root(key, payload)
                .map_err(|e| AppError::Internal(format!("XML serialization failed: {e}")))?;
            Ok((status, [(CONTENT_TYPE, APPLICATION_XML)], body).into_response())
        }
        ResponseFormat::Html => Ok((status, page).into_response()),
    }
}

#[derive(Serialize)]
struct ErrorMessage<'a> {
    message: &'a str,
}

/// Render an error as `{"error": ...}`, `<error><message>...</message></error>`
/// or the HTML `page`.
///
/// # Errors
///
/// Returns `AppError::Internal` if the message cannot be serialized.
pub fn negotiate_error<H>(
    status: StatusCode,
    format: ResponseFormat,
    message: &str,
    page: H,
) -> Result<Response, AppError>
where
    H: IntoResponse,
{
    match format {
        ResponseFormat::Json => negotiate(
            status,
            format,
            "error",
            &serde_json::json!({ "error": message }),
            page,
        ),
        ResponseFormat::Xml | ResponseFormat::Html => {
            negotiate(status, format, "error", &ErrorMessage { message }, page)
        }
    }
}
