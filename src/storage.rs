//! Key-value persistence for client-side state
//!
//! Two things live here: the login payload written by the external login
//! flow, and the last-applied list filter of each list view. Both are
//! stored as JSON strings under a single key.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Stored value is not valid JSON: {0}")]
    Corrupt(String),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// String key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Serialize `value` as JSON and store it under `key`
pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    store.set(key, &json)
}

/// Load and deserialize the JSON value under `key`
///
/// Missing keys yield `Ok(None)`; a value that no longer matches `T`
/// is reported as [`StorageError::Corrupt`].
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::Corrupt(e.to_string())),
        None => Ok(None),
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file
///
/// Every key is a top-level member of the object. The file is re-read on
/// each access and rewritten on each change, so several processes see
/// each other's writes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_object(&self) -> Result<Map<String, Value>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn write_object(&self, object: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(object)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| StorageError::Io(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let object = self.read_object()?;
        Ok(object.get(key).and_then(|v| v.as_str()).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut object = self.read_object()?;
        object.insert(key.to_string(), Value::String(value.to_string()));
        self.write_object(&object)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut object = self.read_object()?;
        if object.remove(key).is_some() {
            self.write_object(&object)?;
        }
        Ok(())
    }
}
