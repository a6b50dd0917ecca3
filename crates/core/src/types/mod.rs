//! Core types for customer profiles.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod gender;
pub mod id;

pub use address::Address;
pub use email::{Email, EmailError};
pub use gender::Gender;
pub use id::*;
