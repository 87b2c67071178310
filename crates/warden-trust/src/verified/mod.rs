//! Pure functions for trust store operations.
//!
//! Everything here is deterministic and free of I/O, following the
//! "Functional Core, Imperative Shell" pattern: the store in
//! [`crate::store`] performs backend calls and delegates key layout and
//! record comparison to this module.
//!
//! # Modules
//!
//! - **keys**: mapping of CA identities onto active and inactive backend slots
//! - **equivalence**: semantic comparison of records, ignoring backend metadata

pub mod equivalence;
pub mod keys;

pub use equivalence::cert_authorities_equivalent;
pub use equivalence::EquivalenceConfig;
pub use keys::active_key;
pub use keys::active_type_range;
pub use keys::inactive_key;
pub use keys::slot_key;
pub use keys::Slot;
