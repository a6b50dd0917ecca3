//! Identity claims carried by verified bearer tokens.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Set of OAuth2 scopes, encoded on the wire as a space-delimited string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scopes(BTreeSet<String>);

impl Scopes {
    /// Parse a space-delimited scope string. Empty segments are skipped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(raw.split_whitespace().map(str::to_owned).collect())
    }

    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(" "))
    }
}

impl<S: AsRef<str>> FromIterator<S> for Scopes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| s.as_ref().to_owned()).collect())
    }
}

impl Serialize for Scopes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Scopes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or_else(Self::default, Self::parse))
    }
}

/// Token claims recognized by the service.
///
/// Unknown claims in a token are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier assigned by the identity provider.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Scopes::is_empty")]
    pub scope: Scopes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Claims for `sub` with the given scopes, expiring at `exp`.
    #[must_use]
    pub fn new(sub: impl Into<String>, scope: Scopes, exp: i64) -> Self {
        Self {
            sub: sub.into(),
            name: None,
            email: None,
            preferred_username: None,
            scope,
            iss: None,
            iat: None,
            nbf: None,
            exp,
        }
    }

    /// Best human-readable label for the subject.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.preferred_username.as_deref())
            .or(self.email.as_deref())
            .unwrap_or(&self.sub)
    }
}

/// Claims that passed verification by the authorization layer.
///
/// Only the authorization middleware constructs this, so a handler holding a
/// `VerifiedClaims` knows the token signature and lifetime were checked.
#[derive(Debug, Clone)]
pub struct VerifiedClaims(Claims);

impl VerifiedClaims {
    pub(crate) const fn new(claims: Claims) -> Self {
        Self(claims)
    }

    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.0
    }

    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.0.scope.contains(scope)
    }

    #[must_use]
    pub fn into_inner(self) -> Claims {
        self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_parse() {
        let scopes = Scopes::parse("openid  profile email");
        assert!(scopes.contains("profile"));
        assert!(!scopes.contains("admin"));
        assert_eq!(scopes.to_string(), "email openid profile");
    }

    #[test]
    fn test_claims_roundtrip_ignores_unknown() {
        let claims: Claims = serde_json::from_str(
            r#"{"sub":"u1","scope":"profile","exp":1700000000,"aud":"profile-service"}"#,
        )
        .unwrap();
        assert_eq!(claims.sub, "u1");
        assert!(claims.scope.contains("profile"));
        assert_eq!(claims.iss, None);
    }

    #[test]
    fn test_missing_scope_is_empty() {
        let claims: Claims = serde_json::from_str(r#"{"sub":"u1","exp":1}"#).unwrap();
        assert!(claims.scope.is_empty());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut claims = Claims::new("u1", Scopes::default(), 0);
        assert_eq!(claims.display_name(), "u1");
        claims.email = Some("a@x.com".to_string());
        assert_eq!(claims.display_name(), "a@x.com");
        claims.name = Some("Ada".to_string());
        assert_eq!(claims.display_name(), "Ada");
    }
}
