//! Places a [`crate::SessionStore`] can keep its keys.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

/// Minimal string key/value semantics, the only thing the session layer
/// needs from a storage medium.
pub trait Storage: Debug + Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Apply a batch of changes, where `None` removes the key.
    ///
    /// Backends which can commit a batch in one step should override this.
    fn apply(
        &mut self,
        changes: &[(&str, Option<&str>)],
    ) -> Result<(), StorageError> {
        for (key, value) in changes {
            match value {
                Some(value) => self.set(key, value)?,
                None => self.remove(key)?,
            }
        }

        Ok(())
    }
}

/// Keys which only live as long as the current process.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self { MemoryStorage::default() }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Keys saved to a JSON file so they survive restarts.
///
/// The file is re-read on every access, letting separate invocations of the
/// same program share one session.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            },
            Err(e) => return Err(self.io_error(e)),
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            inner: e,
        })
    }

    fn save(
        &self,
        items: &BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let serialized = serde_json::to_string_pretty(items).map_err(|e| {
            StorageError::Corrupt {
                path: self.path.clone(),
                inner: e,
            }
        })?;

        // write to a sibling then rename, so readers only ever see a
        // complete file
        let scratch = self.path.with_extension("tmp");
        fs::write(&scratch, serialized).map_err(|e| self.io_error(e))?;
        fs::rename(&scratch, &self.path).map_err(|e| self.io_error(e))?;

        log::trace!("Saved {} keys to {}", items.len(), self.path.display());

        Ok(())
    }

    fn io_error(&self, inner: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            inner,
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut items = self.load()?;
        Ok(items.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(&[(key, Some(value))])
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.apply(&[(key, None)])
    }

    fn apply(
        &mut self,
        changes: &[(&str, Option<&str>)],
    ) -> Result<(), StorageError> {
        let mut items = self.load()?;

        for (key, value) in changes {
            match value {
                Some(value) => {
                    items.insert(key.to_string(), value.to_string());
                },
                None => {
                    items.remove(*key);
                },
            }
        }

        self.save(&items)
    }
}

/// Errors that may occur while reading or writing a [`Storage`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Unable to access \"{}\"", path.display())]
    Io {
        path: PathBuf,
        #[source]
        inner: io::Error,
    },
    #[error("\"{}\" doesn't contain valid session data", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        inner: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_forgets_removed_keys() {
        let mut storage = MemoryStorage::new();

        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").unwrap(), Some(String::from("abc")));

        storage.remove("token").unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));

        assert_eq!(storage.get("token").unwrap(), None);
    }

    #[test]
    fn file_storage_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut first = FileStorage::new(&path);
        first
            .apply(&[("token", Some("t1")), ("userType", Some("doctor"))])
            .unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(second.get("token").unwrap(), Some(String::from("t1")));
        assert_eq!(
            second.get("userType").unwrap(),
            Some(String::from("doctor"))
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn garbage_in_the_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "definitely not json").unwrap();

        let err = FileStorage::new(&path).get("token").unwrap_err();

        assert!(matches!(err, StorageError::Corrupt { .. }));
    }
}
