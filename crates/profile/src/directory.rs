//! In-memory customer directory.
//!
//! The directory is the only source of truth for customer records and owns
//! the ID sequence. Records live in memory for the lifetime of the process;
//! nothing is persisted and nothing is ever deleted.
//!
//! # Concurrency
//!
//! All state sits behind a single mutex. Check-then-act sequences
//! ([`CustomerDirectory::register`], [`CustomerDirectory::update`]) run inside
//! one critical section, so two concurrent registrations for the same email
//! cannot both succeed and ID allocation never races.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use customer_profile_core::{CustomerId, Email};

use crate::models::{Customer, ProfileChanges};

/// ID the sequence starts from; the first customer gets the next one.
pub const INITIAL_SEED: i32 = 1;

/// Errors returned by directory operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// No record matched the lookup.
    #[error("customer not found")]
    NotFound,

    /// Another record already uses this email.
    #[error("email already registered")]
    EmailTaken,

    /// Another record already uses this user name.
    #[error("user name already taken")]
    UserNameTaken,

    /// The ID sequence is exhausted.
    #[error("customer id sequence exhausted")]
    IdsExhausted,
}

/// In-memory collection of customer records.
///
/// Lookups return owned copies; records can only change through
/// [`CustomerDirectory::update`].
#[derive(Debug)]
pub struct CustomerDirectory {
    inner: Mutex<DirectoryInner>,
}

#[derive(Debug)]
struct DirectoryInner {
    customers: BTreeMap<CustomerId, Customer>,
    last_id: CustomerId,
}

impl DirectoryInner {
    fn find_by_email(&self, email: &str) -> Option<&Customer> {
        self.customers.values().find(|c| c.email == *email)
    }

    /// True if a record other than `except` logs in with `user_name`.
    fn user_name_taken(&self, user_name: &str, except: Option<CustomerId>) -> bool {
        !user_name.is_empty()
            && self
                .customers
                .values()
                .any(|c| c.user_name == user_name && Some(c.id) != except)
    }

    fn insert(&mut self, email: Email, password_hash: String) -> Result<Customer, DirectoryError> {
        let id = self.last_id.next().ok_or(DirectoryError::IdsExhausted)?;
        self.last_id = id;

        let customer = Customer::new(id, email, password_hash);
        self.customers.insert(id, customer.clone());
        Ok(customer)
    }
}

impl Default for CustomerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerDirectory {
    /// Create an empty directory seeded with [`INITIAL_SEED`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(CustomerId::new(INITIAL_SEED))
    }

    /// Create an empty directory whose first record gets `seed + 1`.
    #[must_use]
    pub const fn with_seed(seed: CustomerId) -> Self {
        Self {
            inner: Mutex::new(DirectoryInner {
                customers: BTreeMap::new(),
                last_id: seed,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryInner> {
        // Every mutation completes before it can panic, so a poisoned guard
        // still holds consistent data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a new customer with the next ID, without a uniqueness check.
    ///
    /// Callers that need unique emails use [`CustomerDirectory::register`].
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::IdsExhausted` once the ID sequence overflows.
    pub fn create(&self, email: Email, password_hash: String) -> Result<Customer, DirectoryError> {
        let customer = self.lock().insert(email, password_hash)?;
        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Append a new customer unless the email is already registered.
    ///
    /// The new record's user name defaults to its email, so an email that
    /// another record uses as its user name is refused too.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::EmailTaken` for a duplicate email and
    /// `DirectoryError::UserNameTaken` if the email is another record's user name.
    pub fn register(
        &self,
        email: Email,
        password_hash: String,
    ) -> Result<Customer, DirectoryError> {
        let mut inner = self.lock();
        if inner.find_by_email(email.as_str()).is_some() {
            return Err(DirectoryError::EmailTaken);
        }
        if inner.user_name_taken(email.as_str(), None) {
            return Err(DirectoryError::UserNameTaken);
        }
        let customer = inner.insert(email, password_hash)?;
        drop(inner);

        tracing::info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Look up a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if no record has this ID.
    pub fn find_by_id(&self, id: CustomerId) -> Result<Customer, DirectoryError> {
        self.lock()
            .customers
            .get(&id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    /// Look up a customer by email.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if no record has this email.
    pub fn find_by_email(&self, email: &str) -> Result<Customer, DirectoryError> {
        self.lock()
            .find_by_email(email)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    /// Look up a customer by user name.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if no record has this user name.
    pub fn find_by_user_name(&self, user_name: &str) -> Result<Customer, DirectoryError> {
        self.lock()
            .customers
            .values()
            .find(|c| c.user_name == user_name)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    /// True iff a record with this email exists.
    #[must_use]
    pub fn exists_for_email(&self, email: &str) -> bool {
        self.find_by_email(email).is_ok()
    }

    /// Overwrite a record's bindable fields.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` for an unknown ID,
    /// `DirectoryError::EmailTaken` if the new email belongs to another record
    /// and `DirectoryError::UserNameTaken` if the new user name does.
    pub fn update(
        &self,
        id: CustomerId,
        changes: ProfileChanges,
    ) -> Result<Customer, DirectoryError> {
        let mut inner = self.lock();

        if inner
            .find_by_email(changes.email.as_str())
            .is_some_and(|owner| owner.id != id)
        {
            return Err(DirectoryError::EmailTaken);
        }
        if inner.user_name_taken(&changes.user_name, Some(id)) {
            return Err(DirectoryError::UserNameTaken);
        }

        let customer = inner
            .customers
            .get_mut(&id)
            .ok_or(DirectoryError::NotFound)?;
        customer.apply(changes);
        let updated = customer.clone();
        drop(inner);

        tracing::info!(customer_id = %id, "Customer profile updated");
        Ok(updated)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().customers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
