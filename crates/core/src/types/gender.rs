//! Customer gender.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Gender of a customer.
///
/// Encoded on the wire as a lowercase word. Decoding is lenient: the long
/// forms, the one-letter forms (`d`, `f`, `m`) and any casing are accepted,
/// and everything else (including an empty value) becomes [`Gender::Unknown`].
/// Decoding never fails, so an unrecognized value cannot be told apart from
/// an explicit `"unknown"` afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gender {
    #[default]
    Unknown,
    Diverse,
    Female,
    Male,
}

impl Gender {
    /// All variants, in display order.
    pub const ALL: [Self; 4] = [Self::Unknown, Self::Diverse, Self::Female, Self::Male];

    /// Returns the wire encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Diverse => "diverse",
            Self::Female => "female",
            Self::Male => "male",
        }
    }

    /// Lenient decoding of a wire or form value.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "diverse" | "d" => Self::Diverse,
            "female" | "f" => Self::Female,
            "male" | "m" => Self::Male,
            _ => Self::Unknown,
        }
    }

    /// True for [`Gender::Unknown`]; used to omit the field from payloads.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_wire(s))
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Unknown, Self::from_wire))
    }
}
