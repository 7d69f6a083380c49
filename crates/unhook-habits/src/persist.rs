//! Snapshot persistence.
//!
//! The whole [`HabitState`] is written as one blob, `{"version": 2, "state":
//! ...}`, under a single key. Loading never fails: a missing key, a backend
//! error or a blob that does not parse yields fresh-install state.

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use unhook_settings::StorageSettings;
use unhook_storage::{EncryptedStore, FileSecretStore, FileStore, KeyValueStore};

use crate::errors::PersistError;
use crate::store::HabitStore;
use crate::types::HabitState;

/// Snapshot format written by this version.
pub const SNAPSHOT_VERSION: u64 = 2;

/// Storage key of the snapshot.
pub const SNAPSHOT_KEY: &str = "habit-storage";

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u64,
    state: &'a HabitState,
}

/// Reads and writes state snapshots through a [`KeyValueStore`].
#[derive(Debug)]
pub struct SnapshotPersister<S> {
    store: S,
    key: String,
}

/// Persister used on desktop targets: encrypted files under the data dir.
pub type FilePersister = SnapshotPersister<EncryptedStore<FileStore, FileSecretStore>>;

impl<S: KeyValueStore> SnapshotPersister<S> {
    /// Persister under the default key.
    pub fn new(store: S) -> Self {
        Self::with_key(store, SNAPSHOT_KEY)
    }

    /// Persister under a custom key.
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted state, or defaults.
    pub async fn load(&self) -> HabitState {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no snapshot, starting fresh");
                return HabitState::default();
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "snapshot read failed, starting fresh");
                return HabitState::default();
            }
        };
        match decode(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!(key = %self.key, error = %e, "snapshot unreadable, starting fresh");
                HabitState::default()
            }
        }
    }

    /// Write `state` wholesale.
    pub async fn save(&self, state: &HabitState) -> Result<(), PersistError> {
        let blob = serde_json::to_string(&SnapshotRef {
            version: SNAPSHOT_VERSION,
            state,
        })?;
        self.store.set(&self.key, &blob).await?;
        debug!(key = %self.key, bytes = blob.len(), "snapshot saved");
        Ok(())
    }
}

impl FilePersister {
    /// Encrypted file persister for `settings`. Device keys live in a
    /// `keys` directory next to the data files.
    pub fn file_backed(settings: &StorageSettings) -> Self {
        let dir = settings.data_dir_path();
        let secrets = FileSecretStore::new(dir.join("keys"));
        let store =
            EncryptedStore::with_alias(FileStore::new(dir), secrets, settings.key_alias.clone());
        Self::with_key(store, settings.snapshot_key.clone())
    }
}

fn decode(raw: &str) -> Result<HabitState, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let version = value.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version > SNAPSHOT_VERSION {
        warn!(version, "snapshot from a newer version, loading known fields");
    }

    // Current and version-1 blobs wrap the state; bare states are accepted too
    let state = match value {
        Value::Object(mut map) if map.contains_key("state") => {
            map.remove("state").unwrap_or_default()
        }
        other => other,
    };
    let mut state: HabitState = serde_json::from_value(state)?;
    state.progression.normalize();
    Ok(state)
}

/// Load persisted state into `store`, mark it hydrated and settle missed
/// days. Returns whether a missed day reset the streak.
pub async fn hydrate<S: KeyValueStore>(
    store: &HabitStore,
    persister: &SnapshotPersister<S>,
) -> bool {
    let state = persister.load().await;
    store.replace_state(state);
    store.mark_hydrated();
    store.reconcile_missed_days()
}

/// Save every published state until `store` is dropped.
///
/// Bursts coalesce: only the latest state is written.
pub fn spawn_persistence<S>(
    store: &HabitStore,
    persister: SnapshotPersister<S>,
) -> JoinHandle<()>
where
    S: KeyValueStore + 'static,
{
    let mut rx = store.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            if let Err(e) = persister.save(&state).await {
                warn!(error = %e, "snapshot save failed");
            }
        }
        debug!("store dropped, persistence stopped");
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
