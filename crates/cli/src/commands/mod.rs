//! Subcommand implementations.

pub mod password;
pub mod token;
