use super::{check_key, BlobStore};
use crate::error::StorageError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-process blob store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        check_key(key)?;
        self.blobs
            .get(key)
            .map(|b| b.value().clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_key(key)?;
        self.blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn store_new(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_key(key)?;
        match self.blobs.entry(key.to_string()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists(key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(bytes.to_vec());
                Ok(())
            }
        }
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        check_key(key)?;
        self.blobs
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn exists(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }

    fn list(&self, extension: &str) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self
            .blobs
            .iter()
            .filter_map(|e| {
                e.key()
                    .strip_suffix(extension)
                    .filter(|stem| !stem.is_empty())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basics() {
        let store = MemoryStore::new();
        store.store("x.prxr", b"p").unwrap();
        store.store("x.rxr", b"r").unwrap();
        assert!(store.exists("x.rxr"));
        assert_eq!(store.list(".rxr").unwrap(), vec!["x"]);
        assert_eq!(store.load("x.prxr").unwrap(), b"p");
        assert!(matches!(
            store.store_new("x.rxr", b"other"),
            Err(StorageError::AlreadyExists(_))
        ));
        assert_eq!(store.load("x.rxr").unwrap(), b"r");
        store.delete("x.rxr").unwrap();
        assert!(!store.exists("x.rxr"));
        store.store_new("x.rxr", b"again").unwrap();
        assert!(store.list(".rxr").unwrap().is_empty());
    }
}
