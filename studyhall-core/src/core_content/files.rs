//! File store collaborator
//!
//! The service persists attachment bytes through this narrow contract. The
//! default implementation writes to a directory on the local filesystem and
//! names stored files with a fresh uuid so uploads can never collide or
//! traverse outside the root.

use crate::core_model::FileMeta;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::error::ContentError;

/// Where a file store put a saved file
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Name the bytes were stored under
    pub stored_file_name: String,

    /// Full path usable for later delete/stat calls
    pub path: String,

    /// Size in bytes actually written
    pub size: u64,
}

/// Narrow contract over stored attachment bytes
pub trait FileStore: Send + Sync {
    /// Persist `bytes` and return where they landed
    fn save(&self, meta: &FileMeta, bytes: &[u8]) -> Result<StoredFile, ContentError>;

    /// Remove stored bytes
    fn delete(&self, path: &str) -> Result<(), ContentError>;

    /// Whether stored bytes still exist at `path`
    fn stat(&self, path: &str) -> bool;
}

/// Filesystem-backed store rooted at one directory
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Create a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ContentError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| ContentError::FileStore(format!("create {}: {}", root.display(), e)))?;
        Ok(Self { root })
    }

    fn extension_of(name: &str) -> Option<&str> {
        Path::new(name).extension().and_then(|ext| ext.to_str())
    }
}

impl FileStore for LocalFileStore {
    fn save(&self, meta: &FileMeta, bytes: &[u8]) -> Result<StoredFile, ContentError> {
        // Keep the original extension for mime sniffing tools, nothing else.
        let stored_file_name = match Self::extension_of(&meta.original_file_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.root.join(&stored_file_name);

        let mut file = fs::File::create(&path)
            .map_err(|e| ContentError::FileStore(format!("create {}: {}", path.display(), e)))?;
        file.write_all(bytes)
            .map_err(|e| ContentError::FileStore(format!("write {}: {}", path.display(), e)))?;

        Ok(StoredFile {
            stored_file_name,
            path: path.to_string_lossy().into_owned(),
            size: bytes.len() as u64,
        })
    }

    fn delete(&self, path: &str) -> Result<(), ContentError> {
        fs::remove_file(path)
            .map_err(|e| ContentError::FileStore(format!("delete {}: {}", path, e)))
    }

    fn stat(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }
}
