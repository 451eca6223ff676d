use super::{check_key, BlobStore};
use crate::error::StorageError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use ulid::Ulid;

/// One file per key under a base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the store directory.
    pub fn open<P: Into<PathBuf>>(base: P) -> Result<Self, StorageError> {
        let base_dir = base.into();
        fs::create_dir_all(&base_dir)?;
        debug!(dir = %base_dir.display(), "File store opened");
        Ok(Self { base_dir })
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        check_key(key)?;
        Ok(self.base_dir.join(key))
    }

    /// Write `bytes` to a fresh temporary file next to the key's file.
    ///
    /// The leading dot keeps temp names outside the key space; the ULID keeps
    /// concurrent writers of one key apart.
    fn write_temp(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let tmp = self.base_dir.join(format!(".{key}.{}.tmp", Ulid::new()));
        fs::write(&tmp, bytes)?;
        Ok(tmp)
    }
}

fn discard(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp) {
        warn!(path = %tmp.display(), error = %e, "Temporary blob left behind");
    }
}

fn not_found_or_io(key: &str, e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Io(e)
    }
}

impl BlobStore for FileStore {
    fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|e| not_found_or_io(key, e))
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self.write_temp(key, bytes)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            discard(&tmp);
            return Err(e.into());
        }
        debug!(key = %key, size_bytes = bytes.len(), "Blob stored");
        Ok(())
    }

    fn store_new(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self.write_temp(key, bytes)?;
        // linking fails if the target exists, and the file appears complete
        let linked = fs::hard_link(&tmp, &path);
        discard(&tmp);
        match linked {
            Ok(()) => {
                debug!(key = %key, size_bytes = bytes.len(), "Blob created");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::remove_file(&path).map_err(|e| not_found_or_io(key, e))
    }

    fn list(&self, extension: &str) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                warn!(dir = %self.base_dir.display(), "Skipping non UTF-8 file name");
                continue;
            };
            if check_key(file_name).is_err() {
                continue;
            }
            if let Some(stem) = file_name.strip_suffix(extension) {
                if !stem.is_empty() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.store("a.rxr", b"{}").unwrap();
        assert_eq!(store.load("a.rxr").unwrap(), b"{}");
        store.delete("a.rxr").unwrap();
        assert!(matches!(store.load("a.rxr"), Err(StorageError::NotFound(_))));
        assert!(matches!(store.delete("a.rxr"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_store_new_keeps_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.store_new("a.rxr", b"first").unwrap();
        assert!(matches!(
            store.store_new("a.rxr", b"second"),
            Err(StorageError::AlreadyExists(_))
        ));
        assert_eq!(store.load("a.rxr").unwrap(), b"first");
        // no temporary files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_store_new_has_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let wins: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8u8)
                .map(|i| {
                    let store = &store;
                    s.spawn(move || store.store_new("race.rxr", &[i]).is_ok())
                })
                .collect();
            handles.into_iter().map(|h| usize::from(h.join().unwrap())).sum()
        });
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_list_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.store("b.rxr", b"1").unwrap();
        store.store("a.rxr", b"1").unwrap();
        store.store("p.prxr", b"1").unwrap();
        fs::write(dir.path().join("readme.txt"), "notes").unwrap();
        assert_eq!(store.list(".rxr").unwrap(), vec!["a", "b"]);
        assert_eq!(store.list(".prxr").unwrap(), vec!["p"]);
    }

    #[test]
    fn test_traversal_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.store("../escape.rxr", b"x"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
