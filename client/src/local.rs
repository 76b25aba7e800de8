//! Durable local key/value storage for cached report values.

use dashmap::DashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Synchronous byte store. Reads never fail; a value that cannot be read
/// is absent.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()>;
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    values: DashMap<String, Vec<u8>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.get(key).map(|value| value.clone())
    }

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        self.values.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    dir: PathBuf,
}

impl FileLocalStore {
    /// Open `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(file_name)
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(key, error = %err, "Failed to read local value");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryLocalStore::new();
        assert_eq!(store.get("RemindersJsonValue"), None);
        store.set("RemindersJsonValue", b"{}").unwrap();
        assert_eq!(store.get("RemindersJsonValue"), Some(b"{}".to_vec()));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path().join("cache")).unwrap();
        store.set("InsightsSyncedToBridge", b"false").unwrap();
        store.set("InsightsSyncedToBridge", b"true").unwrap();

        let reopened = FileLocalStore::open(store.dir()).unwrap();
        assert_eq!(reopened.get("InsightsSyncedToBridge"), Some(b"true".to_vec()));
        assert_eq!(reopened.get("TreatmentJsonValue"), None);
    }

    #[test]
    fn file_names_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).unwrap();
        store.set("../escape", b"x").unwrap();
        assert!(dir.path().join("___escape").exists());
        assert_eq!(store.get("../escape"), Some(b"x".to_vec()));
    }
}
