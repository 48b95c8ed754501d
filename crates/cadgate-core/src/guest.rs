//! Tenant and guest share identity types.

use crate::{CadgateError, CadgateResult, HashedToken, ShareToken};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Maximum length of a DNS label.
const MAX_TENANT_LEN: usize = 63;

/// Tenant identifier.
///
/// Used verbatim as the upstream subdomain label and as a cache key segment,
/// so it is normalized to lowercase and restricted to a DNS label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Tenant(String);

impl Tenant {
    /// Parses and validates a tenant identifier.
    pub fn parse(raw: &str) -> CadgateResult<Self> {
        let value = raw.trim().to_ascii_lowercase();

        if value.is_empty() {
            return Err(CadgateError::validation("Tenant must not be empty"));
        }
        if value.len() > MAX_TENANT_LEN {
            return Err(CadgateError::validation(format!(
                "Tenant must be at most {} characters",
                MAX_TENANT_LEN
            )));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(CadgateError::validation(
                "Tenant may only contain letters, digits and '-'",
            ));
        }
        if value.starts_with('-') || value.ends_with('-') {
            return Err(CadgateError::validation(
                "Tenant must not start or end with '-'",
            ));
        }

        Ok(Self(value))
    }

    /// Returns the tenant as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Tenant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Tenant::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A guest's authorization to view one call: share id plus raw token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestShare {
    pub id: u64,
    pub token: ShareToken,
}

impl GuestShare {
    /// Creates a guest share, rejecting an empty token.
    pub fn new(id: u64, token: ShareToken) -> CadgateResult<Self> {
        if token.is_empty() {
            return Err(CadgateError::validation("Token must not be empty"));
        }
        Ok(Self { id, token })
    }

    /// Returns the token digest for keys and logs.
    #[must_use]
    pub fn token_hash(&self) -> HashedToken {
        self.token.hashed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_parse_valid() {
        assert_eq!(Tenant::parse("pm").unwrap().as_str(), "pm");
        assert_eq!(Tenant::parse("  Harbor-2 ").unwrap().as_str(), "harbor-2");
    }

    #[test]
    fn test_tenant_parse_rejects_invalid() {
        assert!(Tenant::parse("").is_err());
        assert!(Tenant::parse("   ").is_err());
        assert!(Tenant::parse("pm:42").is_err());
        assert!(Tenant::parse("pm.evil.com").is_err());
        assert!(Tenant::parse("-pm").is_err());
        assert!(Tenant::parse("pm-").is_err());
        assert!(Tenant::parse(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_tenant_deserialize_validates() {
        let tenant: Tenant = serde_json::from_str("\"PM\"").unwrap();
        assert_eq!(tenant.as_str(), "pm");
        assert!(serde_json::from_str::<Tenant>("\"bad tenant\"").is_err());
    }

    #[test]
    fn test_guest_share_rejects_empty_token() {
        assert!(GuestShare::new(42, ShareToken::new("")).is_err());
        let share = GuestShare::new(42, ShareToken::new("abc123")).unwrap();
        assert_eq!(share.token_hash().as_str(), crate::hash_token("abc123"));
        assert!(!format!("{:?}", share).contains("abc123"));
    }
}
