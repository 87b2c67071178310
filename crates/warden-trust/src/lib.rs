//! Certificate authority lifecycle store.
//!
//! Keeps trust-anchor records on a versioned key-value [`Backend`](warden_core::Backend)
//! and moves them between an active and an inactive slot. Every operation maps
//! onto a single conditional backend call, so concurrent writers, whether in one
//! process or spread across a fleet, are serialized by the backend alone.
//!
//! # Modules
//!
//! - [`store`]: [`TrustService`] and its backend-generic implementation [`DefaultTrustStore`]
//! - [`types`]: [`CertAuthority`] and its key material
//! - [`serializer`]: encoding of records into backend values
//! - [`validation`]: structural checks applied before writes and after reads
//! - [`verified`]: pure key-scheme and equivalence functions
//! - [`config`]: TOML and environment configuration
//!
//! # Example
//!
//! ```ignore
//! use warden_core::DeterministicBackend;
//! use warden_trust::{DefaultTrustStore, TrustService};
//!
//! let store = DefaultTrustStore::new(DeterministicBackend::new());
//! store.create_cert_authorities(&[host_ca, user_ca]).await?;
//! store.deactivate_cert_authority(&host_ca.id()).await?;
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod serializer;
pub mod store;
pub mod types;
pub mod validation;
pub mod verified;

pub use config::ConfigError;
pub use config::TrustStoreConfig;
pub use error::ErrorKind;
pub use error::Result;
pub use error::TrustError;
pub use serializer::CaSerializer;
pub use serializer::JsonCaSerializer;
pub use serializer::UnmarshalOptions;
pub use store::DefaultTrustStore;
pub use store::TrustService;
pub use types::CaKeySet;
pub use types::CertAuthId;
pub use types::CertAuthType;
pub use types::CertAuthority;
pub use types::CertAuthoritySpec;
pub use types::JwtKeyPair;
pub use types::Metadata;
pub use types::PrivateKeyType;
pub use types::RoleMap;
pub use types::RoleMapping;
pub use types::Rotation;
pub use types::RotationState;
pub use types::SshKeyPair;
pub use types::TlsKeyPair;
pub use validation::CaValidator;
pub use validation::DefaultCaValidator;
pub use verified::EquivalenceConfig;
