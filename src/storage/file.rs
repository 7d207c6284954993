//! File-based storage implementation.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IntentError, Result};
use crate::storage::{Storage, StorageError, check_name};

/// Configuration for [`FileStorage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStorageConfig {
    /// Root directory holding the files.
    pub path: PathBuf,

    /// Whether to fsync a replacement before it becomes visible.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

fn default_sync_writes() -> bool {
    true
}

impl FileStorageConfig {
    /// Create a configuration rooted at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileStorageConfig {
            path: path.as_ref().to_path_buf(),
            sync_writes: default_sync_writes(),
        }
    }
}

/// A file-based storage implementation.
#[derive(Debug)]
pub struct FileStorage {
    /// The root directory for storage.
    directory: PathBuf,
    /// Storage configuration.
    config: FileStorageConfig,
}

impl FileStorage {
    /// Create a new file storage, creating the root directory if needed.
    pub fn new(config: FileStorageConfig) -> Result<Self> {
        let directory = config.path.clone();

        if !directory.exists() {
            std::fs::create_dir_all(&directory)
                .map_err(|e| IntentError::storage(format!("Failed to create directory: {e}")))?;
        }

        if !directory.is_dir() {
            return Err(IntentError::storage(format!(
                "Path is not a directory: {}",
                directory.display()
            )));
        }

        Ok(FileStorage { directory, config })
    }

    /// Root directory of this storage.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Get the full path for a file name.
    fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    /// Name of a fresh temporary sibling for `name`.
    fn temp_path(&self, name: &str) -> PathBuf {
        let suffix: u64 = rand::random();
        self.directory.join(format!(".{name}.{suffix:016x}.tmp"))
    }
}

impl Storage for FileStorage {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        check_name(name)?;

        let mut file = File::open(self.file_path(name)).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::FileNotFound(name.to_string())
            } else {
                StorageError::IoError(e.to_string())
            }
        })?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        Ok(data)
    }

    fn write_atomic(&self, name: &str, data: &[u8]) -> Result<()> {
        check_name(name)?;

        let temp_path = self.temp_path(name);
        let written = (|| -> std::io::Result<()> {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)?;
            file.write_all(data)?;
            file.flush()?;
            if self.config.sync_writes {
                file.sync_all()?;
            }
            Ok(())
        })();

        if let Err(e) = written {
            let _ = std::fs::remove_file(&temp_path);
            return Err(StorageError::IoError(format!("Failed to write {name}: {e}")).into());
        }

        std::fs::rename(&temp_path, self.file_path(name)).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            StorageError::IoError(format!("Failed to rename file: {e}"))
        })?;

        Ok(())
    }

    fn file_exists(&self, name: &str) -> bool {
        check_name(name).is_ok() && self.file_path(name).is_file()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        check_name(name)?;

        let path = self.file_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| StorageError::IoError(format!("Failed to delete file: {e}")))?;
        }

        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.directory)
            .map_err(|e| StorageError::IoError(format!("Failed to list directory: {e}")))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::IoError(e.to_string()))?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                // Temporary files of in-flight replacements are hidden.
                if !name.starts_with('.') {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();

        Ok(files)
    }
}
