//! String key-value stores the draft layer writes through.

use std::collections::BTreeMap;

use crate::error::StoreError;

/// Flat string store shared by every respondent on a device. Isolation comes
/// from key namespacing in the layer above.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(feature = "fs")]
pub use file::FileStore;

#[cfg(feature = "fs")]
mod file {
    use std::collections::BTreeMap;
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use tracing::debug;

    use super::KeyValueStore;
    use crate::error::StoreError;

    /// Store persisted as a single JSON object on disk. Every write replaces
    /// the file through a temp file in the same directory.
    #[derive(Debug)]
    pub struct FileStore {
        path: PathBuf,
        entries: BTreeMap<String, String>,
    }

    impl FileStore {
        /// Opens `path`, starting empty when the file does not exist yet.
        pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
            let path = path.into();
            let entries = match fs::read_to_string(&path) {
                Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
                Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
                Err(source) => return Err(StoreError::Io { path, source }),
            };
            debug!(path = %path.display(), entries = entries.len(), "opened file store");
            Ok(Self { path, entries })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn flush(&self) -> Result<(), StoreError> {
            let io_err = |source: std::io::Error| StoreError::Io {
                path: self.path.clone(),
                source,
            };
            let dir = match self.path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            fs::create_dir_all(&dir).map_err(io_err)?;

            let bytes = serde_json::to_vec_pretty(&self.entries)?;
            let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
            temp.as_file_mut().write_all(&bytes).map_err(io_err)?;
            temp.as_file().sync_all().map_err(io_err)?;
            temp.persist(&self.path)
                .map_err(|err| io_err(err.error))?;
            Ok(())
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Option<String> {
            self.entries.get(key).cloned()
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            self.entries.insert(key.to_string(), value);
            self.flush()
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            if self.entries.remove(key).is_some() {
                self.flush()?;
            }
            Ok(())
        }

        fn keys(&self) -> Vec<String> {
            self.entries.keys().cloned().collect()
        }
    }
}
