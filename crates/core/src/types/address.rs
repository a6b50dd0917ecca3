//! Postal address value object.

use serde::{Deserialize, Serialize};

/// A customer's postal address.
///
/// Owned by exactly one customer; it has no identity of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zip: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
}

impl Address {
    /// True when every component is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        [
            &self.street,
            &self.city,
            &self.zip,
            &self.state,
            &self.country,
        ]
        .iter()
        .all(|part| part.trim().is_empty())
    }

    /// `None` for a blank address, otherwise the address itself.
    #[must_use]
    pub fn non_blank(self) -> Option<Self> {
        (!self.is_blank()).then_some(self)
    }
}
