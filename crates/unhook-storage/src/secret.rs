//! Device secret storage.
//!
//! Holds the small per-device secrets (the record encryption key). Hosts
//! with a platform keystore implement [`SecretStore`] over it; otherwise
//! [`FileSecretStore`] keeps each secret in an owner-only file, and
//! [`KvSecretStore`] falls back to any [`KeyValueStore`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::kv::{FileStore, KeyValueStore, write_private};

/// Async store for small device-scoped secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Secret stored under `alias`, `None` when absent.
    async fn get_secret(&self, alias: &str) -> Result<Option<String>>;

    /// Store `value` under `alias`.
    async fn set_secret(&self, alias: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    async fn get_secret(&self, alias: &str) -> Result<Option<String>> {
        (**self).get_secret(alias).await
    }

    async fn set_secret(&self, alias: &str, value: &str) -> Result<()> {
        (**self).set_secret(alias, value).await
    }
}

/// One `<alias>.key` file per secret, mode 0o600.
#[derive(Clone, Debug)]
pub struct FileSecretStore {
    files: FileStore,
}

impl FileSecretStore {
    /// Secret store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            files: FileStore::new(dir),
        }
    }

    /// Key file path for `alias`.
    pub fn path_for(&self, alias: &str) -> Result<PathBuf> {
        self.files.path_for(&format!("{alias}.key"))
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        self.files.dir()
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, alias: &str) -> Result<Option<String>> {
        let path = self.path_for(alias)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(Some(data.trim().to_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_secret(&self, alias: &str, value: &str) -> Result<()> {
        let path = self.path_for(alias)?;
        write_private(&path, value).await
    }
}

/// Secrets kept in an ordinary key/value store, for targets without a
/// hardware-backed keystore.
#[derive(Clone)]
pub struct KvSecretStore {
    inner: Arc<dyn KeyValueStore>,
}

impl KvSecretStore {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for KvSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvSecretStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretStore for KvSecretStore {
    async fn get_secret(&self, alias: &str) -> Result<Option<String>> {
        self.inner.get(alias).await
    }

    async fn set_secret(&self, alias: &str, value: &str) -> Result<()> {
        self.inner.set(alias, value).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    #[tokio::test]
    async fn file_secret_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = FileSecretStore::new(dir.path());

        assert!(secrets.get_secret("unhook_encryption_key").await.unwrap().is_none());
        secrets.set_secret("unhook_encryption_key", "c2VjcmV0").await.unwrap();
        assert_eq!(
            secrets.get_secret("unhook_encryption_key").await.unwrap().as_deref(),
            Some("c2VjcmV0")
        );
        assert!(secrets.path_for("unhook_encryption_key").unwrap().ends_with("unhook_encryption_key.key"));
    }

    #[tokio::test]
    async fn file_secret_trims_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = FileSecretStore::new(dir.path());
        std::fs::write(dir.path().join("k.key"), "abc\n").unwrap();
        assert_eq!(secrets.get_secret("k").await.unwrap().as_deref(), Some("abc"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_secret_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let secrets = FileSecretStore::new(dir.path());
        secrets.set_secret("k", "v").await.unwrap();
        let meta = std::fs::metadata(secrets.path_for("k").unwrap()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[tokio::test]
    async fn kv_secret_store_delegates() {
        let kv = Arc::new(MemoryStore::new());
        let secrets = KvSecretStore::new(kv.clone());
        secrets.set_secret("alias", "value").await.unwrap();
        assert_eq!(kv.raw("alias").as_deref(), Some("value"));
        assert_eq!(secrets.get_secret("alias").await.unwrap().as_deref(), Some("value"));
    }
}
