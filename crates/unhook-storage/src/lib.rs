//! # unhook-storage
//!
//! Local persistence for the Unhook core.
//!
//! - [`kv`]: the async [`KeyValueStore`] contract with memory and file backends
//! - [`secret`]: the [`SecretStore`] contract for the device encryption key
//! - [`cipher`]: the `enc_v1:` record format
//! - [`encrypted`]: [`EncryptedStore`], an encrypting drop-in [`KeyValueStore`]

#![deny(unsafe_code)]

pub mod cipher;
pub mod encrypted;
pub mod errors;
pub mod kv;
pub mod secret;

pub use cipher::{ENCRYPTED_PREFIX, FALLBACK_KEY};
pub use encrypted::{DEFAULT_KEY_ALIAS, EncryptedStore, KeySource, StoredValue};
pub use errors::{CipherError, Result, StorageError};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use secret::{FileSecretStore, KvSecretStore, SecretStore};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _store = MemoryStore::new();
        assert_eq!(ENCRYPTED_PREFIX, "enc_v1:");
        assert_eq!(DEFAULT_KEY_ALIAS, "unhook_encryption_key");
    }
}
