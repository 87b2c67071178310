//! Certificate authority records.
//!
//! A [`CertAuthority`] is identified by its [`CertAuthId`] (type plus domain
//! name). Backend metadata (revision and resource id) rides along on the
//! record after a read but is never serialized into the stored value.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use warden_kv_types::Revision;

use crate::constants::MAX_DOMAIN_NAME_LENGTH;
use crate::error::Result;
use crate::error::TrustError;
use crate::serializer::base64_bytes;
use crate::serializer::base64_bytes_opt;

/// Kind of certificate authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertAuthType {
    /// Signs user certificates.
    User,
    /// Signs host certificates.
    Host,
    /// Signs database server certificates.
    Db,
    /// Signs database client certificates.
    DbClient,
    /// Signs certificates for OpenSSH nodes.
    #[serde(rename = "openssh")]
    OpenSsh,
    /// Signs JWT tokens.
    Jwt,
    /// Signs SAML identity provider assertions.
    SamlIdp,
    /// Signs OIDC identity provider tokens.
    OidcIdp,
    /// Issues SPIFFE workload identities.
    Spiffe,
    /// Signs tokens for Okta integration.
    Okta,
    /// Trust anchor for AWS IAM Roles Anywhere.
    AwsRa,
}

impl CertAuthType {
    const ALL: [CertAuthType; 11] = [
        CertAuthType::User,
        CertAuthType::Host,
        CertAuthType::Db,
        CertAuthType::DbClient,
        CertAuthType::OpenSsh,
        CertAuthType::Jwt,
        CertAuthType::SamlIdp,
        CertAuthType::OidcIdp,
        CertAuthType::Spiffe,
        CertAuthType::Okta,
        CertAuthType::AwsRa,
    ];

    /// Every known CA type.
    pub fn all() -> &'static [CertAuthType] {
        &Self::ALL
    }

    /// Key component for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CertAuthType::User => "user",
            CertAuthType::Host => "host",
            CertAuthType::Db => "db",
            CertAuthType::DbClient => "db_client",
            CertAuthType::OpenSsh => "openssh",
            CertAuthType::Jwt => "jwt",
            CertAuthType::SamlIdp => "saml_idp",
            CertAuthType::OidcIdp => "oidc_idp",
            CertAuthType::Spiffe => "spiffe",
            CertAuthType::Okta => "okta",
            CertAuthType::AwsRa => "aws_ra",
        }
    }
}

impl fmt::Display for CertAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertAuthType {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s).ok_or_else(|| TrustError::Validation {
            reason: format!("unknown cert authority type {s:?}"),
        })
    }
}

/// Identity of a certificate authority: (type, domain name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CertAuthId {
    pub ca_type: CertAuthType,
    pub domain_name: String,
}

impl CertAuthId {
    pub fn new(ca_type: CertAuthType, domain_name: impl Into<String>) -> Self {
        Self {
            ca_type,
            domain_name: domain_name.into(),
        }
    }

    /// Structural check applied before the id is turned into a key.
    pub fn check(&self) -> Result<()> {
        if self.domain_name.is_empty() {
            return Err(TrustError::Validation {
                reason: format!("missing domain name for {} cert authority", self.ca_type),
            });
        }
        if self.domain_name.len() > MAX_DOMAIN_NAME_LENGTH {
            return Err(TrustError::Validation {
                reason: format!(
                    "domain name of {} bytes exceeds maximum of {MAX_DOMAIN_NAME_LENGTH}",
                    self.domain_name.len()
                ),
            });
        }
        if self.domain_name.contains('/') {
            return Err(TrustError::Validation {
                reason: format!("domain name {:?} must not contain '/'", self.domain_name),
            });
        }
        Ok(())
    }
}

impl fmt::Display for CertAuthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ca_type, self.domain_name)
    }
}

/// Where a private key lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivateKeyType {
    /// Key bytes are stored inline.
    #[default]
    Raw,
    /// Key is held by an HSM; the stored bytes identify it.
    Pkcs11,
    GcpKms,
    AwsKms,
}

/// SSH signing key pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyPair {
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes_opt")]
    pub private_key: Option<Vec<u8>>,
    #[serde(default)]
    pub private_key_type: PrivateKeyType,
}

/// TLS certificate and key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsKeyPair {
    #[serde(with = "base64_bytes")]
    pub cert: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes_opt")]
    pub key: Option<Vec<u8>>,
    #[serde(default)]
    pub key_type: PrivateKeyType,
}

/// JWT signing key pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtKeyPair {
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes_opt")]
    pub private_key: Option<Vec<u8>>,
    #[serde(default)]
    pub private_key_type: PrivateKeyType,
}

/// Key material grouped by protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaKeySet {
    #[serde(default)]
    pub ssh: Vec<SshKeyPair>,
    #[serde(default)]
    pub tls: Vec<TlsKeyPair>,
    #[serde(default)]
    pub jwt: Vec<JwtKeyPair>,
}

impl CaKeySet {
    pub fn is_empty(&self) -> bool {
        self.ssh.is_empty() && self.tls.is_empty() && self.jwt.is_empty()
    }

    /// Drop every private key, keeping public material.
    pub fn remove_secrets(&mut self) {
        for pair in &mut self.ssh {
            pair.private_key = None;
        }
        for pair in &mut self.tls {
            pair.key = None;
        }
        for pair in &mut self.jwt {
            pair.private_key = None;
        }
    }

    /// Whether any private key is present.
    pub fn has_secrets(&self) -> bool {
        self.ssh.iter().any(|p| p.private_key.is_some())
            || self.tls.iter().any(|p| p.key.is_some())
            || self.jwt.iter().any(|p| p.private_key.is_some())
    }
}

/// Maps roles of a remote cluster onto local roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    /// Remote role name, or `*` for any.
    pub remote: String,
    pub local: Vec<String>,
}

impl RoleMapping {
    pub fn new(remote: impl Into<String>, local: Vec<String>) -> Self {
        Self {
            remote: remote.into(),
            local,
        }
    }
}

pub type RoleMap = Vec<RoleMapping>;

/// Phase of a CA rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationState {
    #[default]
    Standby,
    InProgress,
}

/// Rotation status carried by a CA.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(default)]
    pub state: RotationState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phase: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rotated: Option<DateTime<Utc>>,
}

/// Resource metadata.
///
/// `revision` and `resource_id` are assigned by the backend and attached on
/// read; they are never part of the serialized value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub revision: Option<Revision>,
    #[serde(skip)]
    pub resource_id: i64,
}

/// Certificate authority body: identity, keys and role mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertAuthoritySpec {
    #[serde(rename = "type")]
    pub ca_type: CertAuthType,
    pub cluster_name: String,
    #[serde(default)]
    pub active_keys: CaKeySet,
    #[serde(default)]
    pub additional_trusted_keys: CaKeySet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_map: RoleMap,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signing_alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
}

/// A trust-anchor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertAuthority {
    pub metadata: Metadata,
    pub spec: CertAuthoritySpec,
}

impl CertAuthority {
    /// Create an authority for `cluster_name` with the given active keys.
    pub fn new(ca_type: CertAuthType, cluster_name: impl Into<String>, active_keys: CaKeySet) -> Self {
        let cluster_name = cluster_name.into();
        Self {
            metadata: Metadata {
                name: cluster_name.clone(),
                ..Default::default()
            },
            spec: CertAuthoritySpec {
                ca_type,
                cluster_name,
                active_keys,
                additional_trusted_keys: CaKeySet::default(),
                role_map: Vec::new(),
                signing_alg: String::new(),
                rotation: None,
            },
        }
    }

    pub fn id(&self) -> CertAuthId {
        CertAuthId::new(self.spec.ca_type, self.spec.cluster_name.clone())
    }

    pub fn ca_type(&self) -> CertAuthType {
        self.spec.ca_type
    }

    pub fn cluster_name(&self) -> &str {
        &self.spec.cluster_name
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.metadata.expires
    }

    pub fn revision(&self) -> Option<&Revision> {
        self.metadata.revision.as_ref()
    }

    pub fn resource_id(&self) -> i64 {
        self.metadata.resource_id
    }

    pub fn role_map(&self) -> &RoleMap {
        &self.spec.role_map
    }

    pub fn set_role_map(&mut self, role_map: RoleMap) {
        self.spec.role_map = role_map;
    }

    pub fn with_expires(mut self, expires: Option<DateTime<Utc>>) -> Self {
        self.metadata.expires = expires;
        self
    }

    pub fn with_revision(mut self, revision: Option<Revision>) -> Self {
        self.metadata.revision = revision;
        self
    }

    pub fn with_role_map(mut self, role_map: RoleMap) -> Self {
        self.spec.role_map = role_map;
        self
    }

    pub fn with_additional_trusted_keys(mut self, keys: CaKeySet) -> Self {
        self.spec.additional_trusted_keys = keys;
        self
    }

    /// Strip every private key from active and additional trusted keys.
    pub fn remove_secrets(&mut self) {
        self.spec.active_keys.remove_secrets();
        self.spec.additional_trusted_keys.remove_secrets();
    }

    /// Copy of the record without private key material.
    pub fn without_secrets(&self) -> Self {
        let mut ca = self.clone();
        ca.remove_secrets();
        ca
    }

    pub fn has_secrets(&self) -> bool {
        self.spec.active_keys.has_secrets() || self.spec.additional_trusted_keys.has_secrets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> CaKeySet {
        CaKeySet {
            ssh: vec![SshKeyPair {
                public_key: b"ssh-pub".to_vec(),
                private_key: Some(b"ssh-priv".to_vec()),
                private_key_type: PrivateKeyType::Raw,
            }],
            tls: vec![TlsKeyPair {
                cert: b"cert".to_vec(),
                key: Some(b"key".to_vec()),
                key_type: PrivateKeyType::Raw,
            }],
            jwt: vec![],
        }
    }

    #[test]
    fn cert_auth_type_string_roundtrip() {
        for t in CertAuthType::all() {
            assert_eq!(t.as_str().parse::<CertAuthType>().unwrap(), *t);
        }
    }

    #[test]
    fn unknown_cert_auth_type_rejected() {
        assert!("usr".parse::<CertAuthType>().is_err());
    }

    #[test]
    fn cert_auth_type_serde_matches_key_component() {
        for t in CertAuthType::all() {
            let json = serde_json::to_string(t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn id_check_rejects_empty_domain() {
        assert!(CertAuthId::new(CertAuthType::User, "").check().is_err());
    }

    #[test]
    fn id_check_rejects_separator() {
        assert!(CertAuthId::new(CertAuthType::User, "a/b").check().is_err());
    }

    #[test]
    fn id_check_rejects_oversized_domain() {
        let name = "a".repeat(MAX_DOMAIN_NAME_LENGTH + 1);
        assert!(CertAuthId::new(CertAuthType::Host, name).check().is_err());
    }

    #[test]
    fn id_check_accepts_domain() {
        assert!(CertAuthId::new(CertAuthType::Host, "example.com").check().is_ok());
    }

    #[test]
    fn remove_secrets_strips_all_private_material() {
        let ca = CertAuthority::new(CertAuthType::User, "example.com", keys()).with_additional_trusted_keys(keys());
        assert!(ca.has_secrets());

        let redacted = ca.without_secrets();
        assert!(!redacted.has_secrets());
        assert_eq!(redacted.spec.active_keys.ssh[0].public_key, b"ssh-pub");
        assert_eq!(redacted.spec.active_keys.tls[0].cert, b"cert");
        // The source record keeps its keys.
        assert!(ca.has_secrets());
    }

    #[test]
    fn id_uses_type_and_cluster_name() {
        let ca = CertAuthority::new(CertAuthType::Db, "example.com", keys());
        assert_eq!(ca.id(), CertAuthId::new(CertAuthType::Db, "example.com"));
        assert_eq!(ca.id().to_string(), "db/example.com");
    }
}
