//! Structural validation of certificate authorities.
//!
//! Checks here depend only on the record itself, never on storage state.

use crate::constants::MAX_ROLE_MAPPINGS;
use crate::error::Result;
use crate::error::TrustError;
use crate::types::CaKeySet;
use crate::types::CertAuthType;
use crate::types::CertAuthority;
use crate::types::RoleMap;

/// Decides whether a record is acceptable for storage.
pub trait CaValidator: Send + Sync {
    fn validate(&self, ca: &CertAuthority) -> Result<()>;
}

/// Rules applied when no custom validator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCaValidator;

impl CaValidator for DefaultCaValidator {
    /// Failure reasons are prefixed with the record's identity.
    fn validate(&self, ca: &CertAuthority) -> Result<()> {
        check_record(ca).map_err(|e| match e {
            TrustError::Validation { reason } => invalid(format!("cert authority {}: {reason}", ca.id())),
            other => other,
        })
    }
}

fn check_record(ca: &CertAuthority) -> Result<()> {
    ca.id().check()?;

    if ca.metadata.name.is_empty() {
        return Err(invalid(format!("missing name for {} cert authority", ca.ca_type())));
    }
    if ca.metadata.name != ca.spec.cluster_name {
        return Err(invalid(format!(
            "cert authority name {:?} does not match cluster name {:?}",
            ca.metadata.name, ca.spec.cluster_name
        )));
    }

    check_key_material(&ca.spec.active_keys)?;
    check_key_material(&ca.spec.additional_trusted_keys)?;
    check_required_keys(ca)?;
    check_role_map(&ca.spec.role_map)
}

fn invalid(reason: String) -> TrustError {
    TrustError::Validation { reason }
}

fn check_key_material(keys: &CaKeySet) -> Result<()> {
    if keys.ssh.iter().any(|p| p.public_key.is_empty()) {
        return Err(invalid("SSH key pair has empty public key".into()));
    }
    if keys.tls.iter().any(|p| p.cert.is_empty()) {
        return Err(invalid("TLS key pair has empty certificate".into()));
    }
    if keys.jwt.iter().any(|p| p.public_key.is_empty()) {
        return Err(invalid("JWT key pair has empty public key".into()));
    }
    Ok(())
}

fn check_required_keys(ca: &CertAuthority) -> Result<()> {
    let active = &ca.spec.active_keys;
    let trusted = &ca.spec.additional_trusted_keys;
    let has_ssh = !active.ssh.is_empty() || !trusted.ssh.is_empty();
    let has_tls = !active.tls.is_empty() || !trusted.tls.is_empty();
    let has_jwt = !active.jwt.is_empty() || !trusted.jwt.is_empty();

    let ca_type = ca.ca_type();
    let missing = match ca_type {
        CertAuthType::User | CertAuthType::Host if !has_ssh => Some("SSH"),
        CertAuthType::User | CertAuthType::Host if !has_tls => Some("TLS"),
        CertAuthType::Db
        | CertAuthType::DbClient
        | CertAuthType::SamlIdp
        | CertAuthType::Spiffe
        | CertAuthType::AwsRa
            if !has_tls =>
        {
            Some("TLS")
        }
        CertAuthType::Jwt | CertAuthType::OidcIdp | CertAuthType::Okta if !has_jwt => Some("JWT"),
        CertAuthType::OpenSsh if !has_ssh => Some("SSH"),
        _ => None,
    };

    match missing {
        Some(kind) => Err(invalid(format!(
            "{ca_type} cert authority {} requires a {kind} key pair",
            ca.cluster_name()
        ))),
        None => Ok(()),
    }
}

fn check_role_map(role_map: &RoleMap) -> Result<()> {
    if role_map.len() > MAX_ROLE_MAPPINGS {
        return Err(invalid(format!(
            "role map has {} entries, maximum is {MAX_ROLE_MAPPINGS}",
            role_map.len()
        )));
    }
    for mapping in role_map {
        if mapping.remote.is_empty() {
            return Err(invalid("role mapping has empty remote role".into()));
        }
        if !mapping.local.iter().any(|r| !r.is_empty()) {
            return Err(invalid(format!("role mapping for {:?} has no local roles", mapping.remote)));
        }
    }
    Ok(())
}
