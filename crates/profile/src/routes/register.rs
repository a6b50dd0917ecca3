//! Registration route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::config::RegisterRedirect;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::FormOrJson;
use crate::filters;
use crate::services::{AuthError, AuthService, Registration};
use crate::state::AppState;

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub email: String,
    pub login_url: String,
}

/// Display the registration page.
pub async fn register_page(State(state): State<AppState>) -> impl IntoResponse {
    RegisterTemplate {
        error: None,
        email: String::new(),
        login_url: state.config().login_url.clone(),
    }
}

/// Handle registration form submission.
///
/// The body may be form-encoded or JSON. An unreadable body counts as an
/// empty form. Validation failures re-render the form with 400. On success
/// the new customer is sent to the main site's login page or to their own
/// profile.
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<FormOrJson<Registration>, StatusCode>,
) -> Result<Response> {
    let config = state.config();
    let form = body.map(|FormOrJson(form)| form).unwrap_or_default();

    match AuthService::new(state.directory()).register(&form) {
        Ok(customer) => {
            let customer_id = customer.id.to_string();
            add_breadcrumb(
                "auth",
                "Customer registered",
                Some(&[("customer_id", customer_id.as_str())]),
            );

            let target = match config.register_redirect {
                RegisterRedirect::Login => config.main_login_url(),
                RegisterRedirect::Profile => format!("/profile/{}", customer.id),
            };
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) if e.is_validation() => {
            tracing::info!(error = %e, "Registration rejected");

            // Keep the address only when the passwords were the problem.
            let email = if matches!(e, AuthError::PasswordMismatch) {
                form.email
            } else {
                String::new()
            };

            let page = RegisterTemplate {
                error: Some(AppError::Auth(e).public_message()),
                email,
                login_url: config.login_url.clone(),
            };
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
