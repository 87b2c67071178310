//! In-memory implementation of [`Backend`] for testing.
//!
//! Provides a deterministic, non-persistent backend that honours every
//! condition and atomicity rule of the production contract: all state sits
//! behind a single mutex, so each call checks its preconditions and applies
//! its effects without any other call interleaving.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;
use warden_kv_types::in_range;
use warden_kv_types::validate_atomic_write;
use warden_kv_types::validate_item;
use warden_kv_types::validate_key;
use warden_kv_types::Action;
use warden_kv_types::BackendError;
use warden_kv_types::Condition;
use warden_kv_types::ConditionalAction;
use warden_kv_types::GetRangeResult;
use warden_kv_types::Item;
use warden_kv_types::Key;
use warden_kv_types::Lease;
use warden_kv_types::Revision;

use crate::traits::Backend;

#[derive(Default)]
struct State {
    items: BTreeMap<Key, Item>,
    last_resource_id: i64,
}

impl State {
    /// Live (present and unexpired) item at `key`.
    fn live(&self, key: &Key, now: DateTime<Utc>) -> Option<&Item> {
        self.items.get(key).filter(|item| !item.is_expired_at(now))
    }

    /// Store `item` under `key` with fresh backend metadata.
    fn store(&mut self, key: Key, mut item: Item, revision: Revision) -> Lease {
        self.last_resource_id += 1;
        item.key = key.clone();
        item.revision = Some(revision.clone());
        item.resource_id = self.last_resource_id;
        let lease = Lease {
            key: key.clone(),
            revision,
            resource_id: self.last_resource_id,
        };
        self.items.insert(key, item);
        lease
    }

    fn condition_holds(&self, key: &Key, condition: &Condition, now: DateTime<Utc>) -> bool {
        let current = self.live(key, now);
        match condition {
            Condition::NotExists => current.is_none(),
            Condition::Exists => current.is_some(),
            Condition::Revision(expected) => current.and_then(|item| item.revision.as_ref()) == Some(expected),
            Condition::Whatever => true,
        }
    }
}

fn new_revision() -> Revision {
    Revision::new(Uuid::new_v4().to_string())
}

/// In-memory deterministic implementation of [`Backend`] for testing.
///
/// # Limitations
///
/// - No persistence across restarts
/// - Expired items are hidden from reads but only reclaimed when overwritten
///   or deleted
/// - Single-process only
///
/// # Example
///
/// ```ignore
/// use warden_core::{Backend, DeterministicBackend};
/// use warden_kv_types::{Item, key};
///
/// let backend = DeterministicBackend::new();
/// backend.put(Item::new(key(["a"]), b"value".to_vec())).await?;
/// ```
#[derive(Clone, Default)]
pub struct DeterministicBackend {
    inner: Arc<Mutex<State>>,
}

impl DeterministicBackend {
    /// Create a new empty backend wrapped in Arc.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every live key, in ascending order.
    pub async fn keys(&self) -> Vec<Key> {
        let now = Utc::now();
        let state = self.inner.lock().await;
        state.items.values().filter(|item| !item.is_expired_at(now)).map(|item| item.key.clone()).collect()
    }

    /// Overwrite the raw stored value at `key`, bypassing every check.
    ///
    /// Lets tests plant corrupted or foreign records.
    pub async fn insert_raw(&self, key: Key, value: Vec<u8>) -> Lease {
        let mut state = self.inner.lock().await;
        state.store(key.clone(), Item::new(key, value), new_revision())
    }
}

#[async_trait]
impl Backend for DeterministicBackend {
    async fn get(&self, key: &Key) -> Result<Item, BackendError> {
        validate_key(key)?;
        let state = self.inner.lock().await;
        state.live(key, Utc::now()).cloned().ok_or_else(|| BackendError::NotFound { key: key.to_string() })
    }

    async fn put(&self, item: Item) -> Result<Lease, BackendError> {
        validate_item(&item)?;
        let mut state = self.inner.lock().await;
        let key = item.key.clone();
        Ok(state.store(key, item, new_revision()))
    }

    async fn delete(&self, key: &Key) -> Result<(), BackendError> {
        validate_key(key)?;
        let mut state = self.inner.lock().await;
        let was_live = state.live(key, Utc::now()).is_some();
        state.items.remove(key);
        if was_live {
            Ok(())
        } else {
            Err(BackendError::NotFound { key: key.to_string() })
        }
    }

    async fn delete_range(&self, start: &Key, end: &Key) -> Result<(), BackendError> {
        let mut state = self.inner.lock().await;
        let before = state.items.len();
        state.items.retain(|k, _| !in_range(k, start, end));
        debug!(start = %start, end = %end, removed = before - state.items.len(), "deleted range");
        Ok(())
    }

    async fn get_range(&self, start: &Key, end: &Key, limit: Option<u32>) -> Result<GetRangeResult, BackendError> {
        let now = Utc::now();
        let state = self.inner.lock().await;
        let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let items = state
            .items
            .range(start.clone()..)
            .take_while(|(k, _)| in_range(k, start, end))
            .map(|(_, item)| item)
            .filter(|item| !item.is_expired_at(now))
            .take(limit)
            .cloned()
            .collect();
        Ok(GetRangeResult { items })
    }

    async fn compare_and_swap(&self, expected: Item, replace_with: Item) -> Result<Lease, BackendError> {
        if expected.key != replace_with.key {
            return Err(BackendError::InvalidArgument {
                reason: format!(
                    "compare-and-swap keys differ: expected '{}', replacement '{}'",
                    expected.key, replace_with.key
                ),
            });
        }
        validate_item(&replace_with)?;

        let mut state = self.inner.lock().await;
        let matches = state.live(&expected.key, Utc::now()).is_some_and(|current| current.value == expected.value);
        if !matches {
            return Err(BackendError::CompareFailed {
                key: expected.key.to_string(),
            });
        }
        let key = replace_with.key.clone();
        Ok(state.store(key, replace_with, new_revision()))
    }

    async fn conditional_update(&self, item: Item) -> Result<Lease, BackendError> {
        validate_item(&item)?;

        let mut state = self.inner.lock().await;
        let current_revision = state.live(&item.key, Utc::now()).and_then(|current| current.revision.clone());
        let fenced = matches!(
            (&item.revision, &current_revision),
            (Some(supplied), Some(current)) if supplied == current
        );
        if !fenced {
            return Err(BackendError::CompareFailed {
                key: item.key.to_string(),
            });
        }
        let key = item.key.clone();
        Ok(state.store(key, item, new_revision()))
    }

    async fn atomic_write(&self, actions: Vec<ConditionalAction>) -> Result<Revision, BackendError> {
        validate_atomic_write(&actions)?;

        let now = Utc::now();
        let mut state = self.inner.lock().await;

        // Check every condition before applying any effect.
        for (index, action) in actions.iter().enumerate() {
            if !state.condition_holds(&action.key, &action.condition, now) {
                debug!(key = %action.key, index, "atomic write condition failed");
                return Err(BackendError::ConditionFailed { index: index as u32 });
            }
        }

        let revision = new_revision();
        for action in actions {
            match action.action {
                Action::Put(item) => {
                    state.store(action.key, item, revision.clone());
                }
                Action::Delete => {
                    state.items.remove(&action.key);
                }
            }
        }
        Ok(revision)
    }
}
