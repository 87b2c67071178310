//! Core traits for warden storage.
//!
//! Defines the versioned key-value backend the trust store is built on.

use async_trait::async_trait;
use warden_kv_types::BackendError;
use warden_kv_types::ConditionalAction;
use warden_kv_types::GetRangeResult;
use warden_kv_types::Item;
use warden_kv_types::Key;
use warden_kv_types::Lease;
use warden_kv_types::Revision;

/// Durable key-value store with revisioned items and atomic conditional writes.
///
/// Every method is a single atomicity boundary: a call that returns an error
/// (including a cancelled call) has no partial effect. Implementations must
/// serialize conflicting conditional writes so that exactly one of a set of
/// racing writers observes success.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read a single item. Absent and expired keys are `NotFound`.
    async fn get(&self, key: &Key) -> Result<Item, BackendError>;

    /// Unconditionally store an item, replacing any previous value.
    async fn put(&self, item: Item) -> Result<Lease, BackendError>;

    /// Remove a key. Absent keys are `NotFound`.
    async fn delete(&self, key: &Key) -> Result<(), BackendError>;

    /// Remove every key in `[start, end)`.
    async fn delete_range(&self, start: &Key, end: &Key) -> Result<(), BackendError>;

    /// Read every key in `[start, end)` in ascending order, up to `limit` items.
    async fn get_range(&self, start: &Key, end: &Key, limit: Option<u32>) -> Result<GetRangeResult, BackendError>;

    /// Replace `expected` with `replace_with` if the stored value still equals
    /// `expected.value`. Fails with `CompareFailed` otherwise.
    async fn compare_and_swap(&self, expected: Item, replace_with: Item) -> Result<Lease, BackendError>;

    /// Store `item` if the stored revision equals `item.revision`.
    /// Fails with `CompareFailed` otherwise.
    async fn conditional_update(&self, item: Item) -> Result<Lease, BackendError>;

    /// Check every action's condition and apply every effect as one unit.
    ///
    /// On any failed condition nothing is applied and `ConditionFailed`
    /// reports the first failing action.
    async fn atomic_write(&self, actions: Vec<ConditionalAction>) -> Result<Revision, BackendError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: Backend + ?Sized> Backend for std::sync::Arc<T> {
    async fn get(&self, key: &Key) -> Result<Item, BackendError> {
        (**self).get(key).await
    }

    async fn put(&self, item: Item) -> Result<Lease, BackendError> {
        (**self).put(item).await
    }

    async fn delete(&self, key: &Key) -> Result<(), BackendError> {
        (**self).delete(key).await
    }

    async fn delete_range(&self, start: &Key, end: &Key) -> Result<(), BackendError> {
        (**self).delete_range(start, end).await
    }

    async fn get_range(&self, start: &Key, end: &Key, limit: Option<u32>) -> Result<GetRangeResult, BackendError> {
        (**self).get_range(start, end, limit).await
    }

    async fn compare_and_swap(&self, expected: Item, replace_with: Item) -> Result<Lease, BackendError> {
        (**self).compare_and_swap(expected, replace_with).await
    }

    async fn conditional_update(&self, item: Item) -> Result<Lease, BackendError> {
        (**self).conditional_update(item).await
    }

    async fn atomic_write(&self, actions: Vec<ConditionalAction>) -> Result<Revision, BackendError> {
        (**self).atomic_write(actions).await
    }
}
