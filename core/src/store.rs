//! Durable key-value slots for the sync config and the session record.
//!
//! # Design
//! The store knows nothing about what it holds: each slot is a name mapped to
//! a text value (JSON in practice). Typed access lives in `config` and
//! `session`, which decode the text and degrade gracefully when it is
//! missing or malformed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::error::StoreError;

/// Slot holding the sync endpoint URL and API key.
pub const SYNC_SLOT: &str = "lpsn-buses-sync";

/// Slot holding the current session record.
pub const SESSION_SLOT: &str = "lpsn-buses-session";

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Named text slots. Implementations must be thread-safe.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, slot: &str) -> Result<Option<String>>;

    fn set(&self, slot: &str, value: &str) -> Result<()>;

    /// Removing a missing slot is not an error.
    fn remove(&self, slot: &str) -> Result<()>;
}

/// In-memory store. All data is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> Result<()> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<()> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.remove(slot);
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Writes go to a sibling temp file which is then renamed over the original,
/// so readers never observe a half-written file. A missing file is an empty
/// store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Corrupt("top level is not an object".to_string())),
            Err(e) => Err(StoreError::Corrupt(e.to_string())),
        }
    }

    /// Sibling temp file: the full file name plus `.tmp`, so `data` and
    /// `data.json` never share one.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn save(&self, map: &Map<String, Value>) -> Result<()> {
        let text = serde_json::to_string_pretty(map).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        let map = self.load()?;
        Ok(map.get(slot).and_then(Value::as_str).map(str::to_string))
    }

    fn set(&self, slot: &str, value: &str) -> Result<()> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        let mut map = self.load()?;
        map.insert(slot.to_string(), Value::String(value.to_string()));
        self.save(&map)
    }

    fn remove(&self, slot: &str) -> Result<()> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        let mut map = self.load()?;
        if map.remove(slot).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }
}
