//! Certificate authority trust store.
//!
//! [`DefaultTrustStore`] turns CA lifecycle operations into backend
//! primitives. The store keeps no state of its own between calls: every
//! serialization point between concurrent writers is a conditional backend
//! write, and no operation retries internally.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use tracing::info;
use tracing::warn;
use warden_core::Backend;
use warden_kv_types::validate_atomic_write;
use warden_kv_types::BackendError;
use warden_kv_types::ConditionalAction;
use warden_kv_types::Item;
use warden_kv_types::Key;
use warden_kv_types::MAX_ATOMIC_WRITE_SIZE;

use crate::config::ConfigError;
use crate::config::TrustStoreConfig;
use crate::constants::ACTIONS_PER_CREATE;
use crate::error::Result;
use crate::error::TrustError;
use crate::serializer::CaSerializer;
use crate::serializer::JsonCaSerializer;
use crate::serializer::UnmarshalOptions;
use crate::types::CertAuthId;
use crate::types::CertAuthType;
use crate::types::CertAuthority;
use crate::types::RoleMap;
use crate::validation::CaValidator;
use crate::validation::DefaultCaValidator;
use crate::verified::active_key;
use crate::verified::active_type_range;
use crate::verified::cert_authorities_equivalent;
use crate::verified::slot_key;
use crate::verified::Slot;

/// Certificate authority lifecycle operations.
#[async_trait]
pub trait TrustService: Send + Sync {
    /// Create a CA in the active slot. Fails with `AlreadyExists` if one is there.
    async fn create_cert_authority(&self, ca: &CertAuthority) -> Result<()>;

    /// Create several CAs as one unit: either all are created or none is.
    async fn create_cert_authorities(&self, cas: &[CertAuthority]) -> Result<()>;

    /// Overwrite the active slot unless it already holds an equivalent record.
    async fn upsert_cert_authority(&self, ca: &CertAuthority) -> Result<()>;

    /// Write `ca` if the stored revision equals `ca`'s revision.
    ///
    /// Returns the record carrying the newly assigned revision.
    async fn update_cert_authority(&self, ca: &CertAuthority) -> Result<CertAuthority>;

    /// Replace the active record with `new` if it is still equivalent to `expected`.
    async fn compare_and_swap_cert_authority(&self, new: &CertAuthority, expected: &CertAuthority) -> Result<()>;

    /// Remove a CA from both slots. Absent slots are not an error.
    async fn delete_cert_authority(&self, id: &CertAuthId) -> Result<()>;

    /// Remove several CAs from both slots as one unit.
    async fn delete_cert_authorities(&self, ids: &[CertAuthId]) -> Result<()>;

    /// Move a CA from the inactive slot to the active slot.
    async fn activate_cert_authority(&self, id: &CertAuthId) -> Result<()>;

    /// Move a CA from the active slot to the inactive slot.
    async fn deactivate_cert_authority(&self, id: &CertAuthId) -> Result<()>;

    /// Read an active CA. Private keys are stripped unless `load_signing_keys`.
    async fn get_cert_authority(&self, id: &CertAuthId, load_signing_keys: bool) -> Result<CertAuthority>;

    /// List every active CA of a type, skipping records that fail to decode or validate.
    async fn get_cert_authorities(&self, ca_type: CertAuthType, load_signing_keys: bool) -> Result<Vec<CertAuthority>>;

    /// Remove every active CA of a type.
    async fn delete_all_cert_authorities(&self, ca_type: CertAuthType) -> Result<()>;

    /// Replace the role map of the user CA for cluster `name`.
    async fn update_user_ca_role_map(&self, name: &str, role_map: RoleMap, activated: bool) -> Result<()>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: TrustService + ?Sized> TrustService for Arc<T> {
    async fn create_cert_authority(&self, ca: &CertAuthority) -> Result<()> {
        (**self).create_cert_authority(ca).await
    }

    async fn create_cert_authorities(&self, cas: &[CertAuthority]) -> Result<()> {
        (**self).create_cert_authorities(cas).await
    }

    async fn upsert_cert_authority(&self, ca: &CertAuthority) -> Result<()> {
        (**self).upsert_cert_authority(ca).await
    }

    async fn update_cert_authority(&self, ca: &CertAuthority) -> Result<CertAuthority> {
        (**self).update_cert_authority(ca).await
    }

    async fn compare_and_swap_cert_authority(&self, new: &CertAuthority, expected: &CertAuthority) -> Result<()> {
        (**self).compare_and_swap_cert_authority(new, expected).await
    }

    async fn delete_cert_authority(&self, id: &CertAuthId) -> Result<()> {
        (**self).delete_cert_authority(id).await
    }

    async fn delete_cert_authorities(&self, ids: &[CertAuthId]) -> Result<()> {
        (**self).delete_cert_authorities(ids).await
    }

    async fn activate_cert_authority(&self, id: &CertAuthId) -> Result<()> {
        (**self).activate_cert_authority(id).await
    }

    async fn deactivate_cert_authority(&self, id: &CertAuthId) -> Result<()> {
        (**self).deactivate_cert_authority(id).await
    }

    async fn get_cert_authority(&self, id: &CertAuthId, load_signing_keys: bool) -> Result<CertAuthority> {
        (**self).get_cert_authority(id, load_signing_keys).await
    }

    async fn get_cert_authorities(&self, ca_type: CertAuthType, load_signing_keys: bool) -> Result<Vec<CertAuthority>> {
        (**self).get_cert_authorities(ca_type, load_signing_keys).await
    }

    async fn delete_all_cert_authorities(&self, ca_type: CertAuthType) -> Result<()> {
        (**self).delete_all_cert_authorities(ca_type).await
    }

    async fn update_user_ca_role_map(&self, name: &str, role_map: RoleMap, activated: bool) -> Result<()> {
        (**self).update_user_ca_role_map(name, role_map, activated).await
    }
}

/// Trust store over any [`Backend`].
pub struct DefaultTrustStore<B: Backend> {
    backend: B,
    config: TrustStoreConfig,
    serializer: Arc<dyn CaSerializer>,
    validator: Arc<dyn CaValidator>,
}

impl<B: Backend> DefaultTrustStore<B> {
    /// Create a store with the default configuration, JSON encoding and validation rules.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: TrustStoreConfig::default(),
            serializer: Arc::new(JsonCaSerializer),
            validator: Arc::new(DefaultCaValidator),
        }
    }

    /// Create a store with custom configuration.
    pub fn with_config(backend: B, config: TrustStoreConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_components(backend, config, Arc::new(JsonCaSerializer), Arc::new(DefaultCaValidator))
    }

    /// Create a store with every collaborator injected.
    pub fn with_components(
        backend: B,
        config: TrustStoreConfig,
        serializer: Arc<dyn CaSerializer>,
        validator: Arc<dyn CaValidator>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            serializer,
            validator,
        })
    }

    /// The validated configuration this store was built with.
    pub fn config(&self) -> &TrustStoreConfig {
        &self.config
    }

    /// The backend records are written to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn active_key(&self, id: &CertAuthId) -> Key {
        active_key(&self.config.authorities_prefix, id)
    }

    fn slot_key(&self, id: &CertAuthId, slot: Slot) -> Key {
        slot_key(&self.config.authorities_prefix, &self.config.deactivated_segment, id, slot)
    }

    fn decode(&self, item: &Item) -> Result<CertAuthority> {
        self.serializer.unmarshal(&item.value, UnmarshalOptions::from_item(item))
    }

    /// Read the item at `key`, reporting absence against `id`.
    async fn read_slot(&self, key: &Key, id: &CertAuthId) -> Result<Item> {
        match self.backend.get(key).await {
            Ok(item) => Ok(item),
            Err(BackendError::NotFound { .. }) => Err(TrustError::NotFound {
                reason: format!("cert authority {id} not found"),
            }),
            Err(e) => Err(TrustError::backend("get", id, e)),
        }
    }

    /// Move the record of `id` out of `from` into the other slot.
    ///
    /// The delete is fenced on the revision just read, so a concurrent
    /// mutation or removal aborts the whole move.
    async fn move_slot(&self, id: &CertAuthId, from: Slot) -> Result<()> {
        id.check()?;
        let (verb, state) = match from {
            Slot::Inactive => ("activate", "inactive"),
            Slot::Active => ("deactivate", "active"),
        };

        let from_key = self.slot_key(id, from);
        let to_key = self.slot_key(id, from.other());

        let item = match self.backend.get(&from_key).await {
            Ok(item) => item,
            Err(BackendError::NotFound { .. }) => {
                return Err(TrustError::NotFound {
                    reason: format!(
                        "can not {verb} cert authority {:?} of type {:?} (not a currently {state} ca)",
                        id.domain_name,
                        id.ca_type.as_str()
                    ),
                });
            }
            Err(e) => return Err(TrustError::backend("get", id, e)),
        };
        let Some(revision) = item.revision.clone() else {
            return Err(TrustError::Conflict {
                reason: format!("cert authority {id} has no revision to fence {verb} on"),
            });
        };

        let actions = vec![
            ConditionalAction::delete_at_revision(from_key, revision),
            ConditionalAction::put(to_key, item),
        ];
        match self.backend.atomic_write(actions).await {
            Ok(revision) => {
                info!(ca_type = %id.ca_type, domain = %id.domain_name, %revision, "{verb}d cert authority");
                Ok(())
            }
            Err(e) if e.is_condition_failure() => Err(TrustError::Conflict {
                reason: format!(
                    "failed to {verb} cert authority {:?} of type {:?} due to concurrent modification",
                    id.domain_name,
                    id.ca_type.as_str()
                ),
            }),
            Err(e) => Err(TrustError::backend("atomic write", id, e)),
        }
    }
}

fn check_batch_size(actions: usize) -> Result<()> {
    if actions > MAX_ATOMIC_WRITE_SIZE as usize {
        return Err(TrustError::Validation {
            reason: format!("batch of {actions} actions exceeds maximum of {MAX_ATOMIC_WRITE_SIZE}"),
        });
    }
    Ok(())
}

fn join_ids(ids: &[CertAuthId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

fn settings_updated(cluster_name: &str) -> TrustError {
    TrustError::Conflict {
        reason: format!("cluster {cluster_name} settings have been updated, try again"),
    }
}

#[async_trait]
impl<B: Backend> TrustService for DefaultTrustStore<B> {
    async fn create_cert_authority(&self, ca: &CertAuthority) -> Result<()> {
        self.create_cert_authorities(std::slice::from_ref(ca)).await
    }

    async fn create_cert_authorities(&self, cas: &[CertAuthority]) -> Result<()> {
        if cas.is_empty() {
            return Ok(());
        }
        check_batch_size(cas.len() * ACTIONS_PER_CREATE)?;

        let mut ids: Vec<CertAuthId> = Vec::with_capacity(cas.len());
        let mut actions = Vec::with_capacity(cas.len() * ACTIONS_PER_CREATE);
        for ca in cas {
            let id = ca.id();
            self.validator.validate(ca)?;
            let value = self.serializer.marshal(ca)?;

            let item = Item::new(self.active_key(&id), value).with_expires(ca.expiry());
            actions.push(ConditionalAction::create(self.active_key(&id), item));
            // Clear any stale inactive copy so the identity lives in one slot.
            actions.push(ConditionalAction::delete(self.slot_key(&id, Slot::Inactive)));

            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        // Duplicate identities and oversized records fail here, before the backend sees the batch.
        validate_atomic_write(&actions).map_err(|e| TrustError::Validation {
            reason: format!("invalid create batch for {}: {e}", join_ids(&ids)),
        })?;

        match self.backend.atomic_write(actions).await {
            Ok(revision) => {
                for id in &ids {
                    debug!(ca_type = %id.ca_type, domain = %id.domain_name, %revision, "created cert authority");
                }
                Ok(())
            }
            Err(e) if e.is_condition_failure() => Err(TrustError::AlreadyExists { ids }),
            Err(e) => Err(TrustError::backend("atomic write", join_ids(&ids), e)),
        }
    }

    async fn upsert_cert_authority(&self, ca: &CertAuthority) -> Result<()> {
        self.validator.validate(ca)?;
        let id = ca.id();

        // Any read failure falls through to the write.
        if let Ok(existing) = self.get_cert_authority(&id, true).await {
            if cert_authorities_equivalent(&existing, ca, &self.config.equivalence) {
                debug!(ca_type = %id.ca_type, domain = %id.domain_name, "cert authority unchanged, skipping upsert");
                return Ok(());
            }
        }

        let value = self.serializer.marshal(ca)?;
        let item = Item::new(self.active_key(&id), value).with_expires(ca.expiry());
        let lease = self.backend.put(item).await.map_err(|e| TrustError::backend("put", &id, e))?;
        debug!(ca_type = %id.ca_type, domain = %id.domain_name, revision = %lease.revision, "upserted cert authority");
        Ok(())
    }

    async fn update_cert_authority(&self, ca: &CertAuthority) -> Result<CertAuthority> {
        self.validator.validate(ca)?;
        let id = ca.id();

        let value = self.serializer.marshal(ca)?;
        let item = Item::new(self.active_key(&id), value)
            .with_expires(ca.expiry())
            .with_revision(ca.revision().cloned());

        let lease = match self.backend.conditional_update(item).await {
            Ok(lease) => lease,
            Err(e) if e.is_condition_failure() => {
                return Err(TrustError::Conflict {
                    reason: format!("cert authority {id} was modified concurrently, re-read and retry"),
                });
            }
            Err(e) => return Err(TrustError::backend("conditional update", &id, e)),
        };

        debug!(ca_type = %id.ca_type, domain = %id.domain_name, revision = %lease.revision, "updated cert authority");
        let mut updated = ca.clone().with_revision(Some(lease.revision));
        updated.metadata.resource_id = lease.resource_id;
        Ok(updated)
    }

    async fn compare_and_swap_cert_authority(&self, new: &CertAuthority, expected: &CertAuthority) -> Result<()> {
        self.validator.validate(new)?;
        let id = new.id();
        let key = self.active_key(&id);

        let actual_item = self.read_slot(&key, &id).await?;
        let actual = self.decode(&actual_item)?;
        if !cert_authorities_equivalent(&actual, expected, &self.config.equivalence) {
            return Err(settings_updated(new.cluster_name()));
        }

        let value = self.serializer.marshal(new)?;
        let new_item = Item::new(key, value).with_expires(new.expiry());
        match self.backend.compare_and_swap(actual_item, new_item).await {
            Ok(lease) => {
                debug!(
                    ca_type = %id.ca_type,
                    domain = %id.domain_name,
                    revision = %lease.revision,
                    "swapped cert authority"
                );
                Ok(())
            }
            Err(e) if e.is_condition_failure() => Err(settings_updated(new.cluster_name())),
            Err(e) => Err(TrustError::backend("compare and swap", &id, e)),
        }
    }

    async fn delete_cert_authority(&self, id: &CertAuthId) -> Result<()> {
        self.delete_cert_authorities(std::slice::from_ref(id)).await
    }

    async fn delete_cert_authorities(&self, ids: &[CertAuthId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        check_batch_size(ids.len() * 2)?;

        let mut actions = Vec::with_capacity(ids.len() * 2);
        for id in ids {
            id.check()?;
            actions.push(ConditionalAction::delete(self.slot_key(id, Slot::Active)));
            actions.push(ConditionalAction::delete(self.slot_key(id, Slot::Inactive)));
        }

        self.backend
            .atomic_write(actions)
            .await
            .map_err(|e| TrustError::backend("atomic write", join_ids(ids), e))?;
        for id in ids {
            debug!(ca_type = %id.ca_type, domain = %id.domain_name, "deleted cert authority");
        }
        Ok(())
    }

    async fn activate_cert_authority(&self, id: &CertAuthId) -> Result<()> {
        self.move_slot(id, Slot::Inactive).await
    }

    async fn deactivate_cert_authority(&self, id: &CertAuthId) -> Result<()> {
        self.move_slot(id, Slot::Active).await
    }

    async fn get_cert_authority(&self, id: &CertAuthId, load_signing_keys: bool) -> Result<CertAuthority> {
        id.check()?;
        let item = self.read_slot(&self.active_key(id), id).await?;
        let mut ca = self.decode(&item)?;
        self.validator.validate(&ca)?;
        if !load_signing_keys {
            ca.remove_secrets();
        }
        Ok(ca)
    }

    async fn get_cert_authorities(&self, ca_type: CertAuthType, load_signing_keys: bool) -> Result<Vec<CertAuthority>> {
        let (start, end) = active_type_range(&self.config.authorities_prefix, ca_type);
        let result = self
            .backend
            .get_range(&start, &end, self.config.range_limit)
            .await
            .map_err(|e| TrustError::backend("get range", format!("{ca_type} cert authorities"), e))?;

        let mut cas = Vec::with_capacity(result.items.len());
        for item in &result.items {
            let mut ca = match self.decode(item) {
                Ok(ca) => ca,
                Err(error) => {
                    warn!(key = %item.key, %error, "failed to unmarshal cert authority, skipping");
                    continue;
                }
            };
            if let Err(error) = self.validator.validate(&ca) {
                warn!(key = %item.key, %error, "failed to validate cert authority, skipping");
                continue;
            }
            if !load_signing_keys {
                ca.remove_secrets();
            }
            cas.push(ca);
        }
        Ok(cas)
    }

    async fn delete_all_cert_authorities(&self, ca_type: CertAuthType) -> Result<()> {
        let (start, end) = active_type_range(&self.config.authorities_prefix, ca_type);
        self.backend
            .delete_range(&start, &end)
            .await
            .map_err(|e| TrustError::backend("delete range", format!("{ca_type} cert authorities"), e))?;
        debug!(ca_type = %ca_type, "deleted all cert authorities of type");
        Ok(())
    }

    async fn update_user_ca_role_map(&self, name: &str, role_map: RoleMap, activated: bool) -> Result<()> {
        let id = CertAuthId::new(CertAuthType::User, name);
        id.check()?;
        let slot = if activated { Slot::Active } else { Slot::Inactive };
        let key = self.slot_key(&id, slot);

        let actual_item = self.read_slot(&key, &id).await?;
        let mut actual = self.decode(&actual_item)?;
        actual.set_role_map(role_map);
        self.validator.validate(&actual)?;

        let value = self.serializer.marshal(&actual)?;
        let new_item = Item::new(key, value).with_expires(actual.expiry());
        match self.backend.compare_and_swap(actual_item, new_item).await {
            Ok(lease) => {
                debug!(domain = %id.domain_name, activated, revision = %lease.revision, "updated user CA role map");
                Ok(())
            }
            Err(e) if e.is_condition_failure() => Err(settings_updated(name)),
            Err(e) => Err(TrustError::backend("compare and swap", &id, e)),
        }
    }
}
