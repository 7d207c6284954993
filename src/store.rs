//! Persistence of the dataset and of the embedding records.
//!
//! [`DatasetStore`] and [`EmbeddingStore`] are the injectable load/save
//! interfaces consumed by the classifier. [`JsonStore`] implements both by
//! serializing the full record list as JSON into one file of a
//! [`Storage`](crate::storage::Storage) backend. Saves are full overwrites
//! through [`Storage::write_atomic`](crate::storage::Storage::write_atomic).

use std::path::Path;
use std::sync::Arc;

use log::info;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::classifier::types::{EmbeddingRecord, Example};
use crate::error::Result;
use crate::storage::file::{FileStorage, FileStorageConfig};
use crate::storage::memory::MemoryStorage;
use crate::storage::Storage;

/// Default file name of the dataset.
pub const DATASET_FILE: &str = "dataset.json";

/// Default file name of the embedding records.
pub const EMBEDDINGS_FILE: &str = "embeddings.json";

/// Source and sink of the labeled examples.
pub trait DatasetStore: Send + Sync {
    /// Load the dataset; an empty list when nothing was stored yet.
    fn load(&self) -> Result<Vec<Example>>;

    /// Replace the stored dataset.
    fn save(&self, examples: &[Example]) -> Result<()>;
}

/// Source and sink of the embedding records.
pub trait EmbeddingStore: Send + Sync {
    /// Load the records; an empty list when nothing was stored yet.
    fn load(&self) -> Result<Vec<EmbeddingRecord>>;

    /// Replace the stored records.
    fn save(&self, records: &[EmbeddingRecord]) -> Result<()>;
}

/// A JSON document holding a list of records in a storage backend.
#[derive(Debug, Clone)]
pub struct JsonStore {
    storage: Arc<dyn Storage>,
    name: String,
}

impl JsonStore {
    /// Create a store for the file `name` of `storage`.
    pub fn new<S: Into<String>>(storage: Arc<dyn Storage>, name: S) -> Self {
        JsonStore {
            storage,
            name: name.into(),
        }
    }

    /// Dataset and embeddings stores sharing one storage backend.
    pub fn pair(storage: Arc<dyn Storage>) -> (Self, Self) {
        (
            Self::new(storage.clone(), DATASET_FILE),
            Self::new(storage, EMBEDDINGS_FILE),
        )
    }

    /// Dataset and embeddings stores under the directory `path`.
    pub fn pair_in_directory<P: AsRef<Path>>(path: P) -> Result<(Self, Self)> {
        let storage = FileStorage::new(FileStorageConfig::new(path))?;
        Ok(Self::pair(Arc::new(storage)))
    }

    /// Dataset and embeddings stores held in memory.
    pub fn pair_in_memory() -> (Self, Self) {
        Self::pair(Arc::new(MemoryStorage::default()))
    }

    /// File name inside the storage.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn load_records<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        if !self.storage.file_exists(&self.name) {
            return Ok(Vec::new());
        }

        let data = self.storage.read(&self.name)?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let records: Vec<T> = serde_json::from_slice(&data)?;
        info!("Loaded {} records from {}", records.len(), self.name);
        Ok(records)
    }

    fn save_records<T: Serialize>(&self, records: &[T]) -> Result<()> {
        let data = serde_json::to_vec_pretty(records)?;
        self.storage.write_atomic(&self.name, &data)
    }
}

impl DatasetStore for JsonStore {
    fn load(&self) -> Result<Vec<Example>> {
        self.load_records()
    }

    fn save(&self, examples: &[Example]) -> Result<()> {
        self.save_records(examples)
    }
}

impl EmbeddingStore for JsonStore {
    fn load(&self) -> Result<Vec<EmbeddingRecord>> {
        self.load_records()
    }

    fn save(&self, records: &[EmbeddingRecord]) -> Result<()> {
        self.save_records(records)
    }
}

/// Load training data from a JSON file holding an array of examples.
pub fn load_training_data<P: AsRef<Path>>(path: P) -> Result<Vec<Example>> {
    let content = std::fs::read_to_string(path)?;
    let examples: Vec<Example> = serde_json::from_str(&content)?;
    Ok(examples)
}
