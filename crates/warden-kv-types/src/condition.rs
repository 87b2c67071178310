//! Conditional actions for atomic multi-key writes.

use serde::Deserialize;
use serde::Serialize;

use crate::item::Item;
use crate::item::Revision;
use crate::key::Key;

/// Precondition attached to one action in an atomic write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// The key must be absent.
    NotExists,
    /// The key must be present.
    Exists,
    /// The key must be present at exactly this revision.
    Revision(Revision),
    /// No precondition.
    Whatever,
}

/// Effect applied to a key when every condition in the batch holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Store the item. Its key is replaced by the enclosing action's key.
    Put(Item),
    /// Remove the key. Removing an absent key is not an error.
    Delete,
}

/// One (key, condition, effect) triple of an atomic write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalAction {
    pub key: Key,
    pub condition: Condition,
    pub action: Action,
}

impl ConditionalAction {
    pub fn new(key: Key, condition: Condition, action: Action) -> Self {
        Self { key, condition, action }
    }

    /// Put guarded by `NotExists`.
    pub fn create(key: Key, item: Item) -> Self {
        Self::new(key, Condition::NotExists, Action::Put(item))
    }

    /// Unconditional put.
    pub fn put(key: Key, item: Item) -> Self {
        Self::new(key, Condition::Whatever, Action::Put(item))
    }

    /// Unconditional delete.
    pub fn delete(key: Key) -> Self {
        Self::new(key, Condition::Whatever, Action::Delete)
    }

    /// Delete fenced on a previously observed revision.
    pub fn delete_at_revision(key: Key, revision: Revision) -> Self {
        Self::new(key, Condition::Revision(revision), Action::Delete)
    }
}
