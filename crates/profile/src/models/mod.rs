//! Domain models for the profile service.

pub mod claims;
pub mod customer;

pub use claims::{Claims, Scopes, VerifiedClaims};
pub use customer::{Customer, ProfileChanges, ProfileError, ProfileUpdate};
