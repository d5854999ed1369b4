//! Key/value persistence for favorites.
//!
//! Values are ordered arrays of opaque blobs (one encoded record each). The
//! favorites store only ever touches [`FAVORITES_KEY`].

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

pub const FAVORITES_KEY: &str = "favorites";

pub trait KeyValueStore {
    /// `Ok(None)` when nothing was ever written under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<String>>>;
    fn set(&self, key: &str, blobs: Vec<String>) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<String>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, blobs: Vec<String>) -> Result<()> {
        (**self).set(key, blobs)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Process-local store. Writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<String>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<String>>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, blobs: Vec<String>) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Storage(format!(
                "write to '{}' rejected",
                key
            )));
        }
        self.lock()?.insert(key.to_string(), blobs);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ── JSON file ─────────────────────────────────────────────────────────────────

/// All keys live in one JSON document: `{"favorites": ["{...}", ...]}`.
///
/// Writes replace the file through a sibling `.tmp` file and a rename, and
/// are serialized by an internal lock. A document that cannot be parsed is
/// renamed to `<file>.corrupt` on the next write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let document: Value = serde_json::from_str(&content)?;
        let Value::Object(keys) = document else {
            return Err(StoreError::Corrupt(format!(
                "{:?} does not hold a JSON object",
                self.path
            )));
        };

        let mut entries = BTreeMap::new();
        for (key, value) in keys {
            match value {
                Value::Array(items) => {
                    entries.insert(key, items.into_iter().map(blob_of).collect());
                }
                other => warn!(
                    "Ignoring key '{}' in {:?}: not an array ({})",
                    key, self.path, other
                ),
            }
        }
        Ok(entries)
    }

    /// Move an unreadable document aside so writes can start over.
    fn quarantine(&self, reason: &StoreError) {
        let mut target = self.path.as_os_str().to_owned();
        target.push(".corrupt");
        let target = PathBuf::from(target);
        match std::fs::rename(&self.path, &target) {
            Ok(()) => warn!(
                "Unreadable store {:?} ({}), moved to {:?}",
                self.path, reason, target
            ),
            Err(e) => warn!(
                "Unreadable store {:?} ({}), could not move it aside: {}",
                self.path, reason, e
            ),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, Vec<String>>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Wrote {} key(s) to {:?}", entries.len(), self.path);
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, Vec<String>>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Storage("file store lock poisoned".to_string()))?;
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(e @ (StoreError::Json(_) | StoreError::Corrupt(_))) => {
                self.quarantine(&e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        apply(&mut entries);
        self.write_all(&entries)
    }
}

/// Strings are stored blobs; anything else is handed on in its JSON form and
/// left for the record decoder to accept or reject.
fn blob_of(item: Value) -> String {
    match item {
        Value::String(blob) => blob,
        other => other.to_string(),
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, blobs: Vec<String>) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), blobs);
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
