//! Fixed resource bounds for backend operations.
//!
//! Tiger Style: Constants are fixed and immutable, enforced at compile time.
//! Each constant has explicit bounds to prevent unbounded resource allocation.

// ============================================================================
// Key-Value Size Limits
// ============================================================================

/// Maximum size of a single key in bytes (1 KB).
pub const MAX_KEY_SIZE: u32 = 1024;

/// Maximum size of a single value in bytes (1 MB).
///
/// CA records carry certificate chains and key material; 1 MB leaves ample
/// headroom while still bounding a single item.
pub const MAX_VALUE_SIZE: u32 = 1024 * 1024;

// ============================================================================
// Atomic Write Limits
// ============================================================================

/// Maximum number of conditional actions in a single atomic write (64).
///
/// Every CA create emits two actions, so one batch can bootstrap at most 32
/// authorities.
pub const MAX_ATOMIC_WRITE_SIZE: u32 = 64;

// ============================================================================
// Key Scheme
// ============================================================================

/// Separator between key components.
pub const KEY_SEPARATOR: u8 = b'/';
