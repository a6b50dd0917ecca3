//! Profile view and edit handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::DateTime;

use customer_profile_core::{CustomerId, Gender};

use crate::directory::DirectoryError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::FormOrJson;
use crate::filters;
use crate::middleware::{OptionalClaims, ProfileScope, RequireScope};
use crate::models::{Claims, Customer, ProfileUpdate, VerifiedClaims};
use crate::negotiate::{ResponseFormat, negotiate, negotiate_error};
use crate::state::AppState;

// =============================================================================
// View Models
// =============================================================================

/// One entry of the gender select box.
#[derive(Debug, Clone)]
pub struct GenderOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Customer record flattened for the edit form.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub id: CustomerId,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub gender_options: Vec<GenderOption>,
    pub birthday: String,
    pub street: String,
    pub city: String,
    pub zip: String,
    pub state: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

impl From<&Customer> for ProfileView {
    fn from(customer: &Customer) -> Self {
        let address = customer.address.clone().unwrap_or_default();
        Self {
            id: customer.id,
            display_name: customer.display_name(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            user_name: customer.user_name.clone(),
            gender_options: Gender::ALL
                .into_iter()
                .map(|gender| GenderOption {
                    value: gender.as_str(),
                    selected: gender == customer.gender,
                })
                .collect(),
            birthday: customer
                .birthday
                .map(|date| date.to_string())
                .unwrap_or_default(),
            street: address.street,
            city: address.city,
            zip: address.zip,
            state: address.state,
            country: address.country,
            email: customer.email.to_string(),
            phone: customer.phone_number.clone(),
        }
    }
}

/// Verified identity shown next to the profile.
#[derive(Debug, Clone)]
pub struct ClaimsView {
    pub subject: String,
    pub name: String,
    pub scope: String,
    pub expires: String,
}

impl From<&Claims> for ClaimsView {
    fn from(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            name: claims.display_name().to_string(),
            scope: claims.scope.to_string(),
            expires: DateTime::from_timestamp(claims.exp, 0)
                .map_or_else(|| claims.exp.to_string(), |at| at.to_rfc2822()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub profile: ProfileView,
    pub user: Option<ClaimsView>,
    pub home: String,
}

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: StatusCode,
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Show a profile as HTML, JSON or XML.
///
/// A malformed or unknown ID redirects to the registration page.
pub async fn show(
    State(state): State<AppState>,
    RequireScope(claims, _): RequireScope<ProfileScope>,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Ok(id) = raw_id.parse::<CustomerId>() else {
        tracing::debug!(id = %raw_id, "Profile id is not a number");
        return Ok(Redirect::to("/register").into_response());
    };

    let customer = match state.directory().find_by_id(id) {
        Ok(customer) => customer,
        Err(DirectoryError::NotFound) => {
            tracing::debug!(customer_id = %id, "Profile not found");
            return Ok(Redirect::to("/register").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    render_profile(&state, format, &customer, Some(&claims))
}

fn render_profile(
    state: &AppState,
    format: ResponseFormat,
    customer: &Customer,
    claims: Option<&VerifiedClaims>,
) -> Result<Response> {
    let page = ProfileTemplate {
        profile: ProfileView::from(customer),
        user: claims.map(|c| ClaimsView::from(c.claims())),
        home: state.config().main_url.clone(),
    };

    negotiate(StatusCode::OK, format, "customer", customer, page)
}

/// Update a profile via the scope-guarded `POST`.
pub async fn update_with_scope(
    State(state): State<AppState>,
    RequireScope(claims, _): RequireScope<ProfileScope>,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
    body: std::result::Result<FormOrJson<ProfileUpdate>, StatusCode>,
) -> Result<Response> {
    tracing::debug!(sub = %claims.claims().sub, "Scoped profile update");
    apply_update(&state, format, &raw_id, body)
}

/// Update a profile via the unguarded `PUT`.
///
/// A bearer token is not required; when one is present the caller is logged.
pub async fn update(
    State(state): State<AppState>,
    OptionalClaims(claims): OptionalClaims,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
    body: std::result::Result<FormOrJson<ProfileUpdate>, StatusCode>,
) -> Result<Response> {
    match &claims {
        Some(claims) => tracing::debug!(sub = %claims.claims().sub, "Profile update"),
        None => tracing::debug!("Anonymous profile update"),
    }
    apply_update(&state, format, &raw_id, body)
}

fn apply_update(
    state: &AppState,
    format: ResponseFormat,
    raw_id: &str,
    body: std::result::Result<FormOrJson<ProfileUpdate>, StatusCode>,
) -> Result<Response> {
    let Ok(id) = raw_id.parse::<CustomerId>() else {
        return error_view(format, &AppError::BadRequest(format!("invalid id {raw_id:?}")));
    };

    if let Err(e) = state.directory().find_by_id(id) {
        return error_view(format, &AppError::Directory(e));
    }

    let Ok(FormOrJson(update)) = body else {
        return error_view(
            format,
            &AppError::BadRequest("unreadable profile form".to_string()),
        );
    };

    let changes = match update.validate() {
        Ok(changes) => changes,
        Err(e) => return error_view(format, &AppError::Profile(e)),
    };

    match state.directory().update(id, changes) {
        Ok(customer) => {
            let customer_id = customer.id.to_string();
            add_breadcrumb(
                "profile",
                "Profile updated",
                Some(&[("customer_id", customer_id.as_str())]),
            );
            Ok(Redirect::to(&format!("/profile/{}", customer.id)).into_response())
        }
        Err(e) => error_view(format, &AppError::Directory(e)),
    }
}

/// Render a client error as the negotiated error view.
///
/// Server errors are returned as `AppError` so they reach Sentry.
fn error_view(format: ResponseFormat, error: &AppError) -> Result<Response> {
    let status = error.status();
    if status.is_server_error() {
        return Err(AppError::Internal(error.to_string()));
    }

    tracing::info!(error = %error, %status, "Profile update rejected");

    let message = error.public_message();
    let page = ErrorTemplate {
        status,
        message: message.clone(),
    };
    negotiate_error(status, format, &message, page)
}
