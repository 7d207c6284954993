//! Storage abstraction layer.
//!
//! Persisted state in this crate (the dataset and the embedding records) is
//! always written as a whole, so the storage interface is blob oriented: read
//! a named file completely, or replace it completely. Replacement is atomic:
//! readers observe either the previous contents or the new contents, never a
//! partial write.
//!
//! # Storage Types
//!
//! - [`file::FileStorage`]: files under a root directory, replaced through a
//!   temporary file and a rename.
//! - [`memory::MemoryStorage`]: in-process map, for tests and ephemeral use.
//!
//! # Example
//!
//! ```
//! use hybrid_intent::storage::{StorageConfig, StorageFactory};
//! use hybrid_intent::storage::memory::MemoryStorageConfig;
//!
//! # fn main() -> hybrid_intent::error::Result<()> {
//! let storage = StorageFactory::create(StorageConfig::Memory(MemoryStorageConfig::default()))?;
//! storage.write_atomic("embeddings.json", b"[]")?;
//! assert_eq!(storage.read("embeddings.json")?, b"[]");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{IntentError, Result};

pub mod file;
pub mod memory;

/// A trait for storage backends that hold named blobs.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Read the full contents of a file.
    ///
    /// Fails with [`StorageError::FileNotFound`] when the file does not exist.
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Replace the contents of a file atomically, creating it if needed.
    fn write_atomic(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all files in the storage.
    fn list_files(&self) -> Result<Vec<String>>;
}

/// Storage configuration enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// File-based storage configuration (includes path)
    File(file::FileStorageConfig),

    /// Memory-based storage configuration
    Memory(memory::MemoryStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory(memory::MemoryStorageConfig::default())
    }
}

/// A factory for creating storage instances.
pub struct StorageFactory;

impl StorageFactory {
    /// Create a new storage instance with the given configuration.
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::Memory(mem_config) => {
                let storage = memory::MemoryStorage::new(mem_config);
                Ok(Arc::new(storage))
            }
            StorageConfig::File(file_config) => {
                let storage = file::FileStorage::new(file_config)?;
                Ok(Arc::new(storage))
            }
        }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// File not found.
    FileNotFound(String),

    /// I/O error.
    IoError(String),

    /// Invalid file name.
    InvalidName(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
            StorageError::InvalidName(name) => write!(f, "Invalid file name: {name}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for IntentError {
    fn from(err: StorageError) -> Self {
        IntentError::storage(err.to_string())
    }
}

/// Reject names that would escape the storage root or hide among temp files.
pub(crate) fn check_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..");
    if invalid {
        Err(StorageError::InvalidName(name.to_string()).into())
    } else {
        Ok(())
    }
}
