//! HTTP middleware stack for the profile service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Authorization (verify bearer tokens, attach claims)

pub mod claims;
pub mod request_id;

pub use claims::{
    ClaimsRejection, OptionalClaims, ProfileScope, RequireScope, RequiredScope, authorize,
};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
