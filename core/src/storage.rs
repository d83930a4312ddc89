//! Key-value persistence for store snapshots.
//!
//! # Design
//! Stores persist a subset of their fields as one JSON snapshot per store,
//! wrapped in a `{ "state": ..., "version": N }` envelope. The medium is
//! abstracted behind `KeyValueStorage` (get/set/remove by key), with an
//! in-memory implementation for tests and hosts that do not persist, and a
//! directory-backed one for devices. Snapshots are overwritten wholesale.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Version written into every snapshot envelope. Snapshots with a different
/// version are discarded on load.
pub const SNAPSHOT_VERSION: u32 = 0;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot serialization failed: {0}")]
    Serialization(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String-keyed, string-valued device storage.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Volatile storage; contents live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.items
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
///
/// Writes go to a sibling temp file which is synced and renamed over the
/// target, so a reader never observes a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io = |source: std::io::Error| StorageError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io)?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        {
            let mut file = fs::File::create(&tmp).map_err(io)?;
            file.write_all(value.as_bytes()).map_err(io)?;
            file.sync_all().map_err(io)?;
        }
        fs::rename(&tmp, &target).map_err(io)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    version: u32,
}

/// Serialize `state` into its envelope and write it under `key`.
pub fn save_snapshot<T: Serialize>(
    storage: &dyn KeyValueStorage,
    key: &str,
    state: &T,
) -> Result<(), StorageError> {
    let envelope = Envelope {
        state,
        version: SNAPSHOT_VERSION,
    };
    let json =
        serde_json::to_string(&envelope).map_err(|e| StorageError::Serialization(e.to_string()))?;
    storage.set_item(key, &json)
}

/// Read the snapshot stored under `key`.
///
/// Anything short of a readable, decodable, current-version snapshot yields
/// `None`; the cause is logged.
pub fn load_snapshot<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "could not read persisted snapshot");
            return None;
        }
    };
    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) if envelope.version == SNAPSHOT_VERSION => Some(envelope.state),
        Ok(envelope) => {
            warn!(key, version = envelope.version, "discarding snapshot with unknown version");
            None
        }
        Err(e) => {
            warn!(key, error = %e, "discarding undecodable snapshot");
            None
        }
    }
}
