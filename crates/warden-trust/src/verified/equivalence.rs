//! Semantic equivalence of certificate authority records.

use serde::Deserialize;
use serde::Serialize;

use crate::types::CertAuthority;

/// Fields ignored when comparing records, beyond the backend metadata
/// (revision and resource id) that is always ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivalenceConfig {
    pub ignore_expires: bool,
    pub ignore_rotation: bool,
}

/// Whether two records describe the same authority.
pub fn cert_authorities_equivalent(lhs: &CertAuthority, rhs: &CertAuthority, config: &EquivalenceConfig) -> bool {
    let (l, r) = (&lhs.metadata, &rhs.metadata);
    if l.name != r.name || l.description != r.description || l.labels != r.labels {
        return false;
    }
    if !config.ignore_expires && l.expires != r.expires {
        return false;
    }

    let (l, r) = (&lhs.spec, &rhs.spec);
    l.ca_type == r.ca_type
        && l.cluster_name == r.cluster_name
        && l.active_keys == r.active_keys
        && l.additional_trusted_keys == r.additional_trusted_keys
        && l.role_map == r.role_map
        && l.signing_alg == r.signing_alg
        && (config.ignore_rotation || l.rotation == r.rotation)
}
