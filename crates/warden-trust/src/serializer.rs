//! Encoding of certificate authorities into backend values.

use chrono::DateTime;
use chrono::Utc;
use warden_kv_types::Item;
use warden_kv_types::Revision;

use crate::error::Result;
use crate::error::TrustError;
use crate::types::CertAuthority;

/// Backend metadata attached to a record on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmarshalOptions {
    pub resource_id: i64,
    pub expires: Option<DateTime<Utc>>,
    pub revision: Option<Revision>,
}

impl UnmarshalOptions {
    /// Options carrying the metadata of a stored item.
    pub fn from_item(item: &Item) -> Self {
        Self {
            resource_id: item.resource_id,
            expires: item.expires,
            revision: item.revision.clone(),
        }
    }
}

/// Converts certificate authorities to and from stored bytes.
pub trait CaSerializer: Send + Sync {
    fn marshal(&self, ca: &CertAuthority) -> Result<Vec<u8>>;

    fn unmarshal(&self, data: &[u8], opts: UnmarshalOptions) -> Result<CertAuthority>;
}

/// JSON encoding with base64 key material.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCaSerializer;

impl CaSerializer for JsonCaSerializer {
    fn marshal(&self, ca: &CertAuthority) -> Result<Vec<u8>> {
        serde_json::to_vec(ca).map_err(|e| TrustError::Serialization {
            reason: format!("failed to marshal {} cert authority: {e}", ca.id()),
        })
    }

    fn unmarshal(&self, data: &[u8], opts: UnmarshalOptions) -> Result<CertAuthority> {
        let mut ca: CertAuthority = serde_json::from_slice(data).map_err(|e| TrustError::Serialization {
            reason: format!("failed to unmarshal cert authority: {e}"),
        })?;
        ca.metadata.resource_id = opts.resource_id;
        ca.metadata.revision = opts.revision;
        if opts.expires.is_some() {
            ca.metadata.expires = opts.expires;
        }
        Ok(ca)
    }
}

/// Serde adapter storing `Vec<u8>` as a base64 string.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter storing `Option<Vec<u8>>` as an optional base64 string.
pub(crate) mod base64_bytes_opt {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(b) => serializer.serialize_some(&STANDARD.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)).transpose()
    }
}
