//! Customer Profile Core - Shared types library.
//!
//! This crate provides the domain types used across the customer profile
//! components:
//! - `profile` - The profile web service (registration, authentication, profile pages)
//! - `cli` - Developer tooling for tokens and password hashes
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage, no HTTP. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, validated emails, gender and address value objects

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
