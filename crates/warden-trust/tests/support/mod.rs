//! Shared fixtures and backend wrappers for trust store integration tests.

#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Barrier;
use warden_core::Backend;
use warden_core::BackendError;
use warden_core::ConditionalAction;
use warden_core::GetRangeResult;
use warden_core::Item;
use warden_core::Key;
use warden_core::Lease;
use warden_core::Revision;
use warden_trust::CaKeySet;
use warden_trust::CertAuthType;
use warden_trust::CertAuthority;
use warden_trust::JwtKeyPair;
use warden_trust::PrivateKeyType;
use warden_trust::SshKeyPair;
use warden_trust::TlsKeyPair;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("warden_trust=debug,warden_core=debug").try_init();
}

pub fn ssh_pair(tag: &str) -> SshKeyPair {
    SshKeyPair {
        public_key: format!("ssh-ed25519 {tag}").into_bytes(),
        private_key: Some(format!("ssh-private-{tag}").into_bytes()),
        private_key_type: PrivateKeyType::Raw,
    }
}

pub fn tls_pair(tag: &str) -> TlsKeyPair {
    TlsKeyPair {
        cert: format!("-----BEGIN CERTIFICATE----- {tag}").into_bytes(),
        key: Some(format!("tls-private-{tag}").into_bytes()),
        key_type: PrivateKeyType::Raw,
    }
}

pub fn jwt_pair(tag: &str) -> JwtKeyPair {
    JwtKeyPair {
        public_key: format!("jwk-public-{tag}").into_bytes(),
        private_key: Some(format!("jwk-private-{tag}").into_bytes()),
        private_key_type: PrivateKeyType::Raw,
    }
}

/// A valid authority of any type, with private keys for every protocol it needs.
pub fn ca(ca_type: CertAuthType, cluster: &str) -> CertAuthority {
    let keys = match ca_type {
        CertAuthType::User | CertAuthType::Host => CaKeySet {
            ssh: vec![ssh_pair(cluster)],
            tls: vec![tls_pair(cluster)],
            jwt: vec![],
        },
        CertAuthType::OpenSsh => CaKeySet {
            ssh: vec![ssh_pair(cluster)],
            ..Default::default()
        },
        CertAuthType::Jwt | CertAuthType::OidcIdp | CertAuthType::Okta => CaKeySet {
            jwt: vec![jwt_pair(cluster)],
            ..Default::default()
        },
        _ => CaKeySet {
            tls: vec![tls_pair(cluster)],
            ..Default::default()
        },
    };
    CertAuthority::new(ca_type, cluster, keys)
}

pub fn host_ca(cluster: &str) -> CertAuthority {
    ca(CertAuthType::Host, cluster)
}

pub fn user_ca(cluster: &str) -> CertAuthority {
    ca(CertAuthType::User, cluster)
}

pub fn db_ca(cluster: &str) -> CertAuthority {
    ca(CertAuthType::Db, cluster)
}

/// Backend wrapper whose first `gated` reads wait on a shared barrier after
/// reading, so every gated caller observes the same state before any of them
/// writes.
pub struct BarrierBackend<B> {
    inner: B,
    barrier: Barrier,
    gated: AtomicUsize,
}

impl<B: Backend> BarrierBackend<B> {
    pub fn new(inner: B, gated: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            barrier: Barrier::new(gated),
            gated: AtomicUsize::new(gated),
        })
    }

    fn take_gate(&self) -> bool {
        self.gated.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
    }
}

#[async_trait]
impl<B: Backend> Backend for BarrierBackend<B> {
    async fn get(&self, key: &Key) -> Result<Item, BackendError> {
        let gated = self.take_gate();
        let result = self.inner.get(key).await;
        if gated {
            self.barrier.wait().await;
        }
        result
    }

    async fn put(&self, item: Item) -> Result<Lease, BackendError> {
        self.inner.put(item).await
    }

    async fn delete(&self, key: &Key) -> Result<(), BackendError> {
        self.inner.delete(key).await
    }

    async fn delete_range(&self, start: &Key, end: &Key) -> Result<(), BackendError> {
        self.inner.delete_range(start, end).await
    }

    async fn get_range(&self, start: &Key, end: &Key, limit: Option<u32>) -> Result<GetRangeResult, BackendError> {
        self.inner.get_range(start, end, limit).await
    }

    async fn compare_and_swap(&self, expected: Item, replace_with: Item) -> Result<Lease, BackendError> {
        self.inner.compare_and_swap(expected, replace_with).await
    }

    async fn conditional_update(&self, item: Item) -> Result<Lease, BackendError> {
        self.inner.conditional_update(item).await
    }

    async fn atomic_write(&self, actions: Vec<ConditionalAction>) -> Result<Revision, BackendError> {
        self.inner.atomic_write(actions).await
    }
}

/// Backend wrapper that can be switched to fail reads or writes as unavailable.
pub struct FlakyBackend<B> {
    inner: B,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl<B: Backend> FlakyBackend<B> {
    pub fn new(inner: B) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        })
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), BackendError> {
        if flag.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable {
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<B: Backend> Backend for FlakyBackend<B> {
    async fn get(&self, key: &Key) -> Result<Item, BackendError> {
        self.check(&self.fail_reads)?;
        self.inner.get(key).await
    }

    async fn put(&self, item: Item) -> Result<Lease, BackendError> {
        self.check(&self.fail_writes)?;
        self.inner.put(item).await
    }

    async fn delete(&self, key: &Key) -> Result<(), BackendError> {
        self.check(&self.fail_writes)?;
        self.inner.delete(key).await
    }

    async fn delete_range(&self, start: &Key, end: &Key) -> Result<(), BackendError> {
        self.check(&self.fail_writes)?;
        self.inner.delete_range(start, end).await
    }

    async fn get_range(&self, start: &Key, end: &Key, limit: Option<u32>) -> Result<GetRangeResult, BackendError> {
        self.check(&self.fail_reads)?;
        self.inner.get_range(start, end, limit).await
    }

    async fn compare_and_swap(&self, expected: Item, replace_with: Item) -> Result<Lease, BackendError> {
        self.check(&self.fail_writes)?;
        self.inner.compare_and_swap(expected, replace_with).await
    }

    async fn conditional_update(&self, item: Item) -> Result<Lease, BackendError> {
        self.check(&self.fail_writes)?;
        self.inner.conditional_update(item).await
    }

    async fn atomic_write(&self, actions: Vec<ConditionalAction>) -> Result<Revision, BackendError> {
        self.check(&self.fail_writes)?;
        self.inner.atomic_write(actions).await
    }
}
