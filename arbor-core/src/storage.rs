//! Storage traits for persisted pipeline artifacts.
//!
//! The pipeline persists exactly one kind of artifact through this seam:
//! built reference-layer indexes, keyed by a logical name. The traits are
//! deliberately small — read, existence check, write, delete — and async so
//! the durable backend (object storage in production, the local filesystem
//! in development) can be swapped without touching the processing code.
//!
//! Addresses are relative paths like `layers/parcels.lyr`. Write is
//! overwrite-on-conflict; delete is idempotent.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

/// Read-only storage operations
#[async_trait]
pub trait StorageRead: Debug + Send + Sync {
    /// Read raw bytes from the given address.
    ///
    /// Returns `Error::NotFound` if the resource doesn't exist.
    async fn read_bytes(&self, address: &str) -> Result<Vec<u8>>;

    /// Check if a resource exists at the given address
    async fn exists(&self, address: &str) -> Result<bool>;
}

/// Mutating storage operations
#[async_trait]
pub trait StorageWrite: Debug + Send + Sync {
    /// Write bytes to the given address, overwriting any existing object.
    async fn write_bytes(&self, address: &str, bytes: &[u8]) -> Result<()>;

    /// Delete an object by address.
    ///
    /// Idempotent: deleting a non-existent object succeeds. Only returns
    /// an error for actual failures (I/O, permissions).
    async fn delete(&self, address: &str) -> Result<()>;
}

/// Full storage capability marker
pub trait Storage: StorageRead + StorageWrite {}
impl<T: StorageRead + StorageWrite> Storage for T {}

// ============================================================================
// MemoryStorage Implementation
// ============================================================================

/// A simple in-memory storage for testing
///
/// Stores data in a HashMap behind `Arc<RwLock<...>>` so clones share the
/// same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<std::collections::HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageRead for MemoryStorage {
    async fn read_bytes(&self, address: &str) -> Result<Vec<u8>> {
        self.data
            .read()
            .expect("RwLock poisoned")
            .get(address)
            .cloned()
            .ok_or_else(|| Error::not_found(address))
    }

    async fn exists(&self, address: &str) -> Result<bool> {
        Ok(self
            .data
            .read()
            .expect("RwLock poisoned")
            .contains_key(address))
    }
}

#[async_trait]
impl StorageWrite for MemoryStorage {
    async fn write_bytes(&self, address: &str, bytes: &[u8]) -> Result<()> {
        self.data
            .write()
            .expect("RwLock poisoned")
            .insert(address.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, address: &str) -> Result<()> {
        self.data
            .write()
            .expect("RwLock poisoned")
            .remove(address);
        Ok(())
    }
}

// ============================================================================
// FileStorage Implementation
// ============================================================================

/// File-based storage rooted at a base directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: std::path::PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base path
    pub fn new(base_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the base path for this storage
    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    /// Resolve an address to a file path.
    ///
    /// Disallows absolute paths and path traversal.
    fn resolve_path(&self, address: &str) -> Result<std::path::PathBuf> {
        use std::path::Component;
        let p = std::path::Path::new(address);
        if p.is_absolute()
            || p.components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(Error::storage(format!(
                "Invalid storage path '{}': must be a relative path without '..'",
                address
            )));
        }
        Ok(self.base_path.join(p))
    }
}

#[async_trait]
impl StorageRead for FileStorage {
    async fn read_bytes(&self, address: &str) -> Result<Vec<u8>> {
        let path = self.resolve_path(address)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(format!("{}: {}", address, path.display()))
            } else {
                Error::io(format!("Failed to read {}: {}", path.display(), e))
            }
        })
    }

    async fn exists(&self, address: &str) -> Result<bool> {
        let path = self.resolve_path(address)?;
        match tokio::fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(format!(
                "Failed to stat {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl StorageWrite for FileStorage {
    async fn write_bytes(&self, address: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve_path(address)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::io(format!("Failed to write {}: {}", path.display(), e)))
    }

    async fn delete(&self, address: &str) -> Result<()> {
        let path = self.resolve_path(address)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        storage.write_bytes("layers/test.lyr", b"hello").await.unwrap();

        assert!(storage.exists("layers/test.lyr").await.unwrap());
        let bytes = storage.read_bytes("layers/test.lyr").await.unwrap();
        assert_eq!(bytes, b"hello");

        assert!(!storage.exists("layers/other.lyr").await.unwrap());
        assert!(storage.read_bytes("layers/other.lyr").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_storage_delete_idempotent() {
        let storage = MemoryStorage::new();
        storage.write_bytes("a", b"x").await.unwrap();
        storage.delete("a").await.unwrap();
        assert!(!storage.exists("a").await.unwrap());
        storage.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage
            .write_bytes("layers/munis.lyr", b"polygon bytes")
            .await
            .unwrap();
        assert!(storage.exists("layers/munis.lyr").await.unwrap());
        let bytes = storage.read_bytes("layers/munis.lyr").await.unwrap();
        assert_eq!(bytes, b"polygon bytes");

        storage.delete("layers/munis.lyr").await.unwrap();
        assert!(!storage.exists("layers/munis.lyr").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_storage_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.read_bytes("../outside").await.is_err());
        assert!(storage.write_bytes("/abs/path", b"x").await.is_err());
    }
}
