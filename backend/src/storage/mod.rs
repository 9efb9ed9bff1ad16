//! Durable key-value blob storage.
//!
//! The mood store only ever needs two things from its backing storage: read the
//! blob under a key, and overwrite it. Both calls are synchronous.

mod file;
mod memory;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

pub trait BlobStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored under `key` yet.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Short backend name for logs and readiness checks.
    fn describe(&self) -> String;
}
