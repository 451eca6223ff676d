//! # Storage Module
//!
//! Resource definitions are persisted through a minimal key/blob interface,
//! [`BlobStore`]. The engine never touches the filesystem directly; it only
//! asks for bytes by key.
//!
//! Two backends ship with the crate:
//!
//! - [`FileStore`] keeps one file per key under a directory. Writes go to a
//!   temporary sibling first and are renamed into place, so a reader never
//!   sees a half-written record.
//! - [`MemoryStore`] keeps blobs in a concurrent map. Used by tests and when
//!   the engine is embedded without persistence.
//!
//! ## Keys
//!
//! Keys are flat names such as `MyResource.rxr`. They must match
//! `^[A-Za-z0-9_][A-Za-z0-9_.\-]*$`, which rules out path separators and
//! leading dots. Both backends enforce the same rule.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;
use once_cell::sync::Lazy;
use regex::Regex;

static KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").expect("storage key regex should be valid"));

/// Reject keys that could escape the store's namespace.
pub fn check_key(key: &str) -> Result<(), StorageError> {
    if KEY_REGEX.is_match(key) {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Key/blob persistence with atomic per-key reads and writes.
///
/// Concurrent writers to the same key race; the last write wins.
pub trait BlobStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Like [`BlobStore::store`], but fails with
    /// [`StorageError::AlreadyExists`] when the key is present. Of several
    /// concurrent callers for one key exactly one succeeds.
    fn store_new(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Fails with [`StorageError::NotFound`] when the key is absent.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn exists(&self, key: &str) -> bool {
        self.load(key).is_ok()
    }

    /// Sorted names (key minus `extension`) of every key ending in `extension`.
    fn list(&self, extension: &str) -> Result<Vec<String>, StorageError>;
}
