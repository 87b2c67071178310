//! Backend keys and the pure helpers that build them.
//!
//! Keys are raw bytes ordered lexicographically. Components are joined with a
//! leading `/` separator, so `key(["authorities", "user", "example.com"])`
//! encodes as `/authorities/user/example.com`.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::KEY_SEPARATOR;

/// A backend key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(Vec<u8>);

impl Key {
    /// Build a key from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` starts with every byte of `prefix`.
    pub fn has_prefix(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

/// Join components into a key: `/a/b/c`.
pub fn key<I, S>(parts: I) -> Key
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut bytes = Vec::new();
    for part in parts {
        bytes.push(KEY_SEPARATOR);
        bytes.extend_from_slice(part.as_ref().as_bytes());
    }
    Key(bytes)
}

/// Join components into a key with a trailing separator: `/a/b/`.
///
/// Used as the start of a prefix range. The trailing separator keeps the range
/// for `user` from reaching keys under `user_v2`.
pub fn exact_key<I, S>(parts: I) -> Key
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut k = key(parts);
    k.0.push(KEY_SEPARATOR);
    k
}

/// Smallest key strictly greater than every key that has `prefix` as a prefix.
///
/// Increments the last byte that is not `0xff` and drops everything after it.
/// A prefix made only of `0xff` bytes (or empty) has no finite successor; the
/// empty key is returned, which range reads treat as "no upper bound".
pub fn range_end(prefix: &Key) -> Key {
    let mut end = prefix.0.clone();
    while let Some(last) = end.last_mut() {
        if *last < u8::MAX {
            *last += 1;
            return Key(end);
        }
        end.pop();
    }
    Key::default()
}

/// Whether `key` falls in the half-open range `[start, end)`.
///
/// An empty `end` leaves the range unbounded above.
#[inline]
pub fn in_range(key: &Key, start: &Key, end: &Key) -> bool {
    key >= start && (end.is_empty() || key < end)
}
