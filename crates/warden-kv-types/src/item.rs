//! Persisted items and the metadata the backend attaches to them.

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::key::Key;

/// Opaque version token assigned by the backend on every write.
///
/// Callers must only compare revisions for equality; ordering carries no
/// meaning across backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single persisted key-value entry.
///
/// Items are replaced wholesale on every write; nothing mutates a stored item
/// in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub key: Key,
    pub value: Vec<u8>,
    /// Instant after which the backend treats the item as absent.
    pub expires: Option<DateTime<Utc>>,
    /// Revision observed when the item was read; `None` for items not yet written.
    pub revision: Option<Revision>,
    /// Backend-assigned ordinal, strictly increasing across writes.
    pub resource_id: i64,
}

impl Item {
    /// Create an item with no expiry and no backend metadata.
    pub fn new(key: Key, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key,
            value: value.into(),
            expires: None,
            revision: None,
            resource_id: 0,
        }
    }

    pub fn with_expires(mut self, expires: Option<DateTime<Utc>>) -> Self {
        self.expires = expires;
        self
    }

    pub fn with_revision(mut self, revision: Option<Revision>) -> Self {
        self.revision = revision;
        self
    }

    /// Whether the item has expired at `now`.
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

/// Result of a successful single-key write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub key: Key,
    pub revision: Revision,
    pub resource_id: i64,
}

/// Result of a range read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRangeResult {
    /// Items in ascending key order.
    pub items: Vec<Item>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn item_without_expiry_never_expires() {
        let item = Item::new(Key::from("/k"), b"v".to_vec());
        assert!(!item.is_expired_at(Utc::now()));
    }

    #[test]
    fn item_expires_at_deadline() {
        let now = Utc::now();
        let item = Item::new(Key::from("/k"), b"v".to_vec()).with_expires(Some(now));
        assert!(item.is_expired_at(now));
        assert!(!item.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn revision_display_is_token() {
        assert_eq!(Revision::new("abc").to_string(), "abc");
    }
}
