//! Password hashing command.
//!
//! Reads one line from stdin so the password never shows up in shell history:
//!
//! ```bash
//! printf '%s' 'p1' | profile-cli password hash
//! ```

use std::io::BufRead;

use thiserror::Error;

use customer_profile::services::{AuthError, auth::hash_password};

/// Errors that can occur while hashing a password.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Could not read password: {0}")]
    Read(#[from] std::io::Error),

    #[error("Empty password")]
    Empty,

    #[error("Hashing failed: {0}")]
    Hash(#[from] AuthError),
}

/// Hash the first line of `input` into an Argon2id PHC string.
///
/// # Errors
///
/// Returns an error if reading fails, the line is empty, or hashing fails.
pub fn hash(mut input: impl BufRead) -> Result<String, PasswordError> {
    let mut line = String::new();
    input.read_line(&mut line)?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }

    Ok(hash_password(password)?)
}
