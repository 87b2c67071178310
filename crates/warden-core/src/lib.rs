//! Core storage traits for warden.
//!
//! - **Traits**: [`Backend`], the versioned key-value contract consumed by the
//!   trust store
//! - **In-memory**: [`DeterministicBackend`], a deterministic implementation
//!   used by tests and simulations
//!
//! Backend data types are re-exported from `warden-kv-types`.

pub mod inmemory;
pub mod traits;

pub use inmemory::DeterministicBackend;
pub use traits::Backend;
pub use warden_kv_types::Action;
pub use warden_kv_types::BackendError;
pub use warden_kv_types::Condition;
pub use warden_kv_types::ConditionalAction;
pub use warden_kv_types::GetRangeResult;
pub use warden_kv_types::Item;
pub use warden_kv_types::Key;
pub use warden_kv_types::Lease;
pub use warden_kv_types::Revision;
