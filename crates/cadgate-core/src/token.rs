//! Guest share token handling.
//!
//! The raw token a guest presents is a credential. It is only ever sent to the
//! upstream CAD API; everywhere else (cache keys, log fields, events) it is
//! represented by its SHA-1 digest.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

/// Hashes a raw token into 40 lowercase hex characters.
///
/// Unsalted so that keys built in different processes for the same token
/// collide.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha1::digest(token.as_bytes()))
}

/// One-way digest of a [`ShareToken`], safe for keys and logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashedToken(String);

impl HashedToken {
    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw guest share token.
///
/// Deliberately has no `Display` and a redacted `Debug`, so it cannot end up
/// in a log line or a formatted key by accident.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    /// Wraps a raw token.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the digest used in keys and logs.
    #[must_use]
    pub fn hashed(&self) -> HashedToken {
        HashedToken(hash_token(&self.0))
    }

    /// Returns the raw token, for the upstream request only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShareToken(***)")
    }
}
