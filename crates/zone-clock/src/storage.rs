//! Durable key/value storage backends for the persisted zone list.
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// A string key/value store that survives restarts.
pub trait Storage {
    /// Reads the value under `key`, or [`None`] if nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrites the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S> Storage for &mut S
where
    S: Storage + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        S::get(self, key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        S::set(self, key, value)
    }
}

/// In-memory store. Can be given a quota (total bytes across all values) or disabled outright,
/// which makes it useful for exercising the failure paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryStorage {
    /// An empty, unlimited store.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store that rejects writes past `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// A store where every read and write fails.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    /// Seeds a value directly, bypassing the quota.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.items.insert(key.into(), value.into());
        self
    }

    /// Peeks at a value without going through [`Storage::get`].
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    fn used_excluding(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable);
        }

        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable);
        }

        if let Some(quota) = self.quota {
            let needed = self.used_excluding(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    len: value.len(),
                });
            }
        }

        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// File backed store: each key lives in `<dir>/<key>.json`.
///
/// Writes go to a temporary file first, then get renamed over the old value, so a crash
/// mid-write never leaves a truncated payload behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Stores values under `dir`. The directory is created on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory values are stored in.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // keys are fixed strings in practice, but keep anything path-like out of the file name.
        let file_name: String = key
            .chars()
            .map(|ch| match ch {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => ch,
                _ => '_',
            })
            .collect();

        self.dir.join(format!("{file_name}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_quota() {
        let mut storage = MemoryStorage::with_quota(16);

        storage.set("key", "0123456789").unwrap();
        // overwriting only counts the new value
        storage.set("key", "9876543210").unwrap();

        let err = storage.set("key", "this is far too long").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { len: 20, .. }), "{err}");
        assert_eq!(storage.raw("key"), Some("9876543210"));
    }

    #[test]
    fn test_memory_disabled() {
        let mut storage = MemoryStorage::disabled();
        assert!(matches!(storage.get("key"), Err(StorageError::Unavailable)));
        assert!(matches!(storage.set("key", "v"), Err(StorageError::Unavailable)));
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("zone-clock-{}", uuid::Uuid::new_v4()));
        let mut storage = FileStorage::new(&dir);

        assert_eq!(storage.get("timezone-converter-locations").unwrap(), None);

        storage.set("timezone-converter-locations", "[1,2,3]").unwrap();
        storage.set("timezone-converter-locations", "[4]").unwrap();
        assert_eq!(
            storage.get("timezone-converter-locations").unwrap().as_deref(),
            Some("[4]")
        );
        assert!(dir.join("timezone-converter-locations.json").is_file());

        // path separators don't escape the directory
        storage.set("../escape", "x").unwrap();
        assert!(dir.join(".._escape.json").is_file());

        fs::remove_dir_all(&dir).unwrap();
    }
}
