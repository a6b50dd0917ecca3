//! Customer domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use customer_profile_core::{Address, CustomerId, Email, EmailError, Gender};

/// Date format accepted from forms (`YYYY-MM-DD`).
pub const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

/// A customer profile record.
///
/// Serialization is the outward representation used by the JSON/XML profile
/// views and the authenticate endpoint: empty optional fields are omitted and
/// the password hash is never written.
#[derive(Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_name: String,
    #[serde(skip_serializing_if = "Gender::is_unknown")]
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub email: Email,
    #[serde(rename = "phone", skip_serializing_if = "String::is_empty")]
    pub phone_number: String,
    #[serde(skip)]
    pub(crate) password_hash: String,
}

impl Customer {
    /// A freshly registered customer: the user name defaults to the email.
    #[must_use]
    pub fn new(id: CustomerId, email: Email, password_hash: String) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            user_name: email.to_string(),
            gender: Gender::Unknown,
            birthday: None,
            address: None,
            email,
            phone_number: String::new(),
            password_hash,
        }
    }

    /// The stored Argon2 PHC string.
    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Overwrite every bindable field with the validated changes.
    ///
    /// The ID and password are not bindable and stay untouched.
    pub fn apply(&mut self, changes: ProfileChanges) {
        self.first_name = changes.first_name;
        self.last_name = changes.last_name;
        self.user_name = changes.user_name;
        self.gender = changes.gender;
        self.birthday = changes.birthday;
        self.address = changes.address;
        self.email = changes.email;
        self.phone_number = changes.phone_number;
    }

    /// First and last name, or the user name when both are empty.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.user_name.clone()
        } else {
            full.to_string()
        }
    }
}

impl std::fmt::Debug for Customer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Customer")
            .field("id", &self.id)
            .field("user_name", &self.user_name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Profile edit form, as bound from a form-encoded or JSON body.
///
/// Every field defaults to empty, so a field missing from the request clears
/// the stored value. An `id` field, if present, is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub gender: Gender,
    pub birthday: String,
    pub street_address: String,
    pub city: String,
    pub zip: String,
    pub state: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

/// Validation failures of a [`ProfileUpdate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("invalid birthday {0:?}, expected YYYY-MM-DD")]
    InvalidBirthday(String),
}

/// A validated [`ProfileUpdate`], ready to be applied to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub gender: Gender,
    pub birthday: Option<NaiveDate>,
    pub address: Option<Address>,
    pub email: Email,
    pub phone_number: String,
}

impl ProfileUpdate {
    /// Validate the bound form.
    ///
    /// A blank birthday, or one equal to `0001-01-01` (the zero date), means
    /// "no birthday". Blank address parts collapse to no address.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if the email or birthday cannot be parsed.
    pub fn validate(self) -> Result<ProfileChanges, ProfileError> {
        let email = Email::parse(self.email.trim())?;
        let birthday = parse_birthday(&self.birthday)?;

        let address = Address {
            street: self.street_address,
            city: self.city,
            zip: self.zip,
            state: self.state,
            country: self.country,
        }
        .non_blank();

        Ok(ProfileChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            user_name: self.user_name,
            gender: self.gender,
            birthday,
            address,
            email,
            phone_number: self.phone,
        })
    }
}

fn parse_birthday(raw: &str) -> Result<Option<NaiveDate>, ProfileError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let date = NaiveDate::parse_from_str(raw, BIRTHDAY_FORMAT)
        .map_err(|_| ProfileError::InvalidBirthday(raw.to_string()))?;

    Ok((Some(date) != NaiveDate::from_ymd_opt(1, 1, 1)).then_some(date))
}
