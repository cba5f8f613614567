use screen_recorder_common::{KeyValueStore, RecorderError, RecorderResult, StoreError};
use web_sys::{Storage, Window};

use crate::backend::js_error;

/// `window.localStorage`
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn from_window(window: &Window) -> RecorderResult<Self> {
        let storage = window
            .local_storage()
            .map_err(|e| RecorderError::Platform(js_error(e)))?
            .ok_or_else(|| RecorderError::Platform("localStorage is unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Backend(js_error(e)))
    }

    // Throws QuotaExceededError once the origin's storage is full.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Backend(js_error(e)))
    }
}
