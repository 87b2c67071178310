//! Constants for the trust store.
//!
//! Tiger Style: Fixed limits prevent unbounded resource allocation.

/// Default first key component for every CA record.
pub const DEFAULT_AUTHORITIES_PREFIX: &str = "authorities";

/// Default key component nesting the inactive slot under the authorities prefix.
pub const DEFAULT_DEACTIVATED_SEGMENT: &str = "deactivated";

/// Maximum length of a CA domain (cluster) name in bytes.
pub const MAX_DOMAIN_NAME_LENGTH: usize = 253;

/// Maximum number of entries in a role map.
pub const MAX_ROLE_MAPPINGS: usize = 256;

/// Actions emitted per CA by a create.
pub const ACTIONS_PER_CREATE: usize = 2;
