//! Authentication service.
//!
//! Registration and password authentication against the customer directory.
//! Passwords are stored as salted Argon2id hashes and verified in constant time.

mod error;

pub use error::AuthError;

use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use serde::Deserialize;

use customer_profile_core::Email;

use crate::directory::{CustomerDirectory, DirectoryError};
use crate::models::Customer;

/// Registration form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub repeated_password: String,
}

/// Authentication service.
///
/// Borrowed per request from the shared application state.
pub struct AuthService<'a> {
    directory: &'a CustomerDirectory,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(directory: &'a CustomerDirectory) -> Self {
        Self { directory }
    }

    /// Register a new customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if any field is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::PasswordMismatch` if the passwords differ.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub fn register(&self, registration: &Registration) -> Result<Customer, AuthError> {
        let email = required("email", registration.email.trim())?;
        let password = required("password", &registration.password)?;
        required("repeated_password", &registration.repeated_password)?;

        if password != registration.repeated_password {
            return Err(AuthError::PasswordMismatch);
        }

        let email = Email::parse(email)?;

        // Cheap pre-check so a duplicate does not pay for a hash. `register`
        // repeats the check under the directory lock.
        if self.directory.exists_for_email(email.as_str()) {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;

        self.directory
            .register(email, password_hash)
            .map_err(|e| match e {
                DirectoryError::EmailTaken | DirectoryError::UserNameTaken => {
                    AuthError::UserAlreadyExists
                }
                other => AuthError::Directory(other),
            })
    }

    /// Authenticate by user name and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user name is unknown or
    /// the password is wrong.
    pub fn authenticate(&self, user_name: &str, password: &str) -> Result<Customer, AuthError> {
        let customer = self
            .directory
            .find_by_user_name(user_name)
            .map_err(|_| AuthError::InvalidCredentials)?;

        verify_password(password, customer.password_hash())?;

        Ok(customer)
    }
}

fn required<'s>(field: &'static str, value: &'s str) -> Result<&'s str, AuthError> {
    if value.is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
