//! Encrypted persistence adapter.
//!
//! [`EncryptedStore`] wraps a [`KeyValueStore`] and encrypts every value it
//! writes. It is itself a [`KeyValueStore`], so callers swap it in without
//! changes.
//!
//! Key handling: the device key is read from the [`SecretStore`] on first
//! use, generated and stored when absent, and cached for the lifetime of the
//! adapter. When the secret store fails or holds a malformed key, the
//! adapter runs in degraded mode on [`FALLBACK_KEY`].
//!
//! Reads classify each stored value as [`StoredValue`]: decrypted records,
//! legacy plaintext written before encryption existed, and prefixed values
//! that fail to decode (returned raw). Backend failures are logged and
//! swallowed, so this adapter never returns `Err`.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::cipher::{self, FALLBACK_KEY};
use crate::errors::Result;
use crate::kv::KeyValueStore;
use crate::secret::SecretStore;

/// Default secret-store alias of the device key.
pub const DEFAULT_KEY_ALIAS: &str = "unhook_encryption_key";

/// Where the active encryption key came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySource {
    /// Read from the secret store.
    Stored,
    /// Generated on first use and saved to the secret store.
    Generated,
    /// Secret store unusable; constant key in use.
    Fallback,
}

/// A value read back through [`EncryptedStore::read`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoredValue {
    /// Prefixed record, decrypted.
    Decrypted(String),
    /// Unprefixed plaintext from before encryption was introduced.
    Legacy(String),
    /// Prefixed record that failed to decode; the raw stored string.
    Undecodable(String),
}

impl StoredValue {
    /// The string handed to callers for every variant.
    pub fn into_inner(self) -> String {
        match self {
            Self::Decrypted(s) | Self::Legacy(s) | Self::Undecodable(s) => s,
        }
    }

    /// Whether the value was stored unencrypted.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }
}

struct DeviceKey {
    bytes: Vec<u8>,
    source: KeySource,
}

/// Encrypting [`KeyValueStore`] decorator.
pub struct EncryptedStore<S, K> {
    inner: S,
    secrets: K,
    alias: String,
    key: OnceCell<DeviceKey>,
}

impl<S, K> EncryptedStore<S, K>
where
    S: KeyValueStore,
    K: SecretStore,
{
    /// Wrap `inner`, keeping the device key in `secrets` under the default
    /// alias.
    pub fn new(inner: S, secrets: K) -> Self {
        Self::with_alias(inner, secrets, DEFAULT_KEY_ALIAS)
    }

    /// Wrap `inner` with a custom key alias.
    pub fn with_alias(inner: S, secrets: K, alias: impl Into<String>) -> Self {
        Self {
            inner,
            secrets,
            alias: alias.into(),
            key: OnceCell::new(),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Source of the active key, resolving it if needed.
    pub async fn key_source(&self) -> KeySource {
        self.device_key().await.source
    }

    async fn device_key(&self) -> &DeviceKey {
        self.key.get_or_init(|| self.resolve_key()).await
    }

    async fn resolve_key(&self) -> DeviceKey {
        match self.secrets.get_secret(&self.alias).await {
            Ok(Some(encoded)) => match cipher::decode_key(&encoded) {
                Ok(bytes) => {
                    debug!(alias = %self.alias, "loaded encryption key");
                    DeviceKey {
                        bytes,
                        source: KeySource::Stored,
                    }
                }
                Err(e) => {
                    warn!(alias = %self.alias, error = %e, "stored encryption key is malformed, using fallback key");
                    fallback_key()
                }
            },
            Ok(None) => {
                let bytes = cipher::generate_key().to_vec();
                match self
                    .secrets
                    .set_secret(&self.alias, &cipher::encode_key(&bytes))
                    .await
                {
                    Ok(()) => {
                        debug!(alias = %self.alias, "generated encryption key");
                        DeviceKey {
                            bytes,
                            source: KeySource::Generated,
                        }
                    }
                    Err(e) => {
                        warn!(alias = %self.alias, error = %e, "failed to save encryption key, using fallback key");
                        fallback_key()
                    }
                }
            }
            Err(e) => {
                warn!(alias = %self.alias, error = %e, "secret store unavailable, using fallback key");
                fallback_key()
            }
        }
    }

    /// Read and classify the value under `key`.
    ///
    /// `None` when the key is absent or the backend failed.
    pub async fn read(&self, key: &str) -> Option<StoredValue> {
        let raw = match self.inner.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "storage read failed");
                return None;
            }
        };

        if !cipher::is_encrypted(&raw) {
            debug!(key, "read legacy plaintext value");
            return Some(StoredValue::Legacy(raw));
        }

        let device_key = self.device_key().await;
        match cipher::decrypt(&raw, &device_key.bytes) {
            Ok(plain) => Some(StoredValue::Decrypted(plain)),
            Err(e) => {
                warn!(key, error = %e, "encrypted value is undecodable, returning raw value");
                Some(StoredValue::Undecodable(raw))
            }
        }
    }
}

fn fallback_key() -> DeviceKey {
    DeviceKey {
        bytes: FALLBACK_KEY.to_vec(),
        source: KeySource::Fallback,
    }
}

#[async_trait]
impl<S, K> KeyValueStore for EncryptedStore<S, K>
where
    S: KeyValueStore,
    K: SecretStore,
{
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read(key).await.map(StoredValue::into_inner))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let device_key = self.device_key().await;
        let record = match cipher::encrypt(value, &device_key.bytes) {
            Ok(record) => record,
            Err(e) => {
                warn!(key, error = %e, "encryption failed, value not stored");
                return Ok(());
            }
        };
        if let Err(e) = self.inner.set(key, &record).await {
            warn!(key, error = %e, "storage write failed");
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if let Err(e) = self.inner.remove(key).await {
            warn!(key, error = %e, "storage remove failed");
        }
        Ok(())
    }
}

impl<S, K> std::fmt::Debug for EncryptedStore<S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedStore")
            .field("alias", &self.alias)
            .field("key_source", &self.key.get().map(|k| k.source))
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
