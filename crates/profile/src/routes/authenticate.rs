//! Password authentication for the main site.
//!
//! The main site posts a user name and password and receives the customer
//! record plus the URL of their profile page. Failures carry no body.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::set_sentry_user;
use crate::extract::FormOrJson;
use crate::models::Customer;
use crate::services::AuthService;
use crate::state::AppState;

/// Credentials posted to `/authenticate`.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

/// Successful authentication payload.
#[derive(Debug, Serialize)]
pub struct Authenticated {
    pub user: Customer,
    pub profile_url: String,
}

/// Verify credentials and return the customer.
pub async fn authenticate(
    State(state): State<AppState>,
    FormOrJson(credentials): FormOrJson<Credentials>,
) -> Response {
    match AuthService::new(state.directory())
        .authenticate(&credentials.user_name, &credentials.password)
    {
        Ok(customer) => {
            set_sentry_user(&customer.id, Some(customer.email.as_str()));
            tracing::info!(customer_id = %customer.id, "Customer authenticated");

            let profile_url = state.config().profile_url(customer.id);
            Json(Authenticated {
                user: customer,
                profile_url,
            })
            .into_response()
        }
        Err(e) => {
            tracing::info!(error = %e, "Authentication failed");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}
