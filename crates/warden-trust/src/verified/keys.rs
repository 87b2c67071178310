//! Key scheme for certificate authority records.
//!
//! ```text
//! /<prefix>/<type>/<domain>                active slot
//! /<prefix>/<deactivated>/<type>/<domain>  inactive slot
//! ```
//!
//! Type precedes domain so all active records of one type form a contiguous
//! range. Range starts carry a trailing separator, so `db` never reaches
//! `db_client`.

use warden_kv_types::exact_key;
use warden_kv_types::key;
use warden_kv_types::range_end;
use warden_kv_types::Key;

use crate::types::CertAuthId;
use crate::types::CertAuthType;

/// One of the two locations an identity's record may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Active,
    Inactive,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::Active => Slot::Inactive,
            Slot::Inactive => Slot::Active,
        }
    }
}

#[inline]
pub fn active_key(prefix: &str, id: &CertAuthId) -> Key {
    key([prefix, id.ca_type.as_str(), id.domain_name.as_str()])
}

#[inline]
pub fn inactive_key(prefix: &str, deactivated: &str, id: &CertAuthId) -> Key {
    key([prefix, deactivated, id.ca_type.as_str(), id.domain_name.as_str()])
}

pub fn slot_key(prefix: &str, deactivated: &str, id: &CertAuthId, slot: Slot) -> Key {
    match slot {
        Slot::Active => active_key(prefix, id),
        Slot::Inactive => inactive_key(prefix, deactivated, id),
    }
}

/// Half-open range `[start, end)` covering every active record of `ca_type`.
pub fn active_type_range(prefix: &str, ca_type: CertAuthType) -> (Key, Key) {
    let start = exact_key([prefix, ca_type.as_str()]);
    let end = range_end(&start);
    (start, end)
}
