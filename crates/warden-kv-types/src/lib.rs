//! Backend data model for the warden trust store.
//!
//! Lightweight, sync-only types shared by backend implementations and their
//! consumers:
//!
//! - [`key`]: byte keys, `/`-joined key building, exact-prefix range helpers
//! - [`item`]: persisted items, revisions, leases
//! - [`condition`]: conditional actions submitted to atomic writes
//! - [`validation`]: size and batch checks applied before a request runs
//! - [`error`]: the backend error taxonomy

pub mod condition;
pub mod constants;
pub mod error;
pub mod item;
pub mod key;
pub mod validation;

pub use condition::Action;
pub use condition::Condition;
pub use condition::ConditionalAction;
pub use constants::KEY_SEPARATOR;
pub use constants::MAX_ATOMIC_WRITE_SIZE;
pub use constants::MAX_KEY_SIZE;
pub use constants::MAX_VALUE_SIZE;
pub use error::BackendError;
pub use item::GetRangeResult;
pub use item::Item;
pub use item::Lease;
pub use item::Revision;
pub use key::exact_key;
pub use key::in_range;
pub use key::key;
pub use key::range_end;
pub use key::Key;
pub use validation::validate_atomic_write;
pub use validation::validate_item;
pub use validation::validate_key;
