//! Persisted recordings list
//!
//! A single string key holding a JSON array of entries in insertion order.

use std::collections::HashMap;

use crate::entry::RecordingEntry;
use crate::error::StoreError;

pub const DEFAULT_STORAGE_KEY: &str = "screenRecordings";

/// String key-value storage (localStorage in the browser)
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store, optionally capped to mimic a full quota
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes whose value exceeds `bytes`
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            items: HashMap::new(),
            capacity: Some(bytes),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(capacity) = self.capacity {
            if value.len() > capacity {
                return Err(StoreError::Backend(format!(
                    "quota exceeded: {} bytes > {} bytes",
                    value.len(),
                    capacity
                )));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Append-only log of recording entries over a key-value store
pub struct EntryLog<K> {
    store: K,
    key: String,
}

impl<K: KeyValueStore> EntryLog<K> {
    pub fn new(store: K, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    /// Read every persisted entry. A missing key is an empty list.
    pub fn load(&self) -> Result<Vec<RecordingEntry>, StoreError> {
        match self.store.get_item(&self.key)? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(StoreError::Corrupt),
        }
    }

    /// Append one entry and write the whole list back.
    ///
    /// Returns the new number of persisted entries.
    pub fn append(&mut self, entry: &RecordingEntry) -> Result<usize, StoreError> {
        let mut entries = self.load()?;
        entries.push(entry.clone());
        let raw = serde_json::to_string(&entries)?;
        self.store.set_item(&self.key, &raw)?;
        Ok(entries.len())
    }
}
