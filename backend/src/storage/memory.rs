use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{BlobStore, StorageError};

/// Process-local storage. Clones share the same map, which lets a test keep a
/// handle on the blobs a store has written.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, String>>>,
    fail_writes: Arc<RwLock<bool>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_blob(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut blobs) = store.blobs.write() {
            blobs.insert(key.to_string(), value.to_string());
        }
        store
    }

    /// Makes every subsequent `save` fail, as a full or disabled disk would.
    #[cfg(test)]
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.write() {
            *flag = fail;
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs.read().ok()?.get(key).cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".into()))?;
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let failing = self.fail_writes.read().map(|f| *f).unwrap_or(true);
        if failing {
            return Err(StorageError::Unavailable("quota exceeded".into()));
        }
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".into()))?;
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
