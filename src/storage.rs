//! Flat key-value persistence for the task forest and settings.
//!
//! The store only needs `get`/`set`/`remove` by string key. `FileStorage`
//! keeps one JSON file per key under `.timemaster/`; `MemoryStorage` keeps
//! everything in a map and can enforce a byte quota.

use eyre::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Storage directory name.
pub const STORE_DIR: &str = ".timemaster";

/// A flat string-keyed blob store.
pub trait KeyValueStore {
    /// Read a value; `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses writes once the total payload would exceed
    /// `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + value.len();
            if needed > quota {
                eyre::bail!("Storage quota exceeded: {} bytes needed, {} allowed", needed, quota);
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store: `<root>/.timemaster/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Initialize storage in the given directory.
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(STORE_DIR);
        fs::create_dir_all(&dir).context("Failed to create .timemaster directory")?;
        Ok(Self { dir })
    }

    /// Open existing storage.
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(STORE_DIR);
        if !dir.is_dir() {
            eyre::bail!("No .timemaster directory found. Run 'tm init' first.");
        }
        Ok(Self { dir })
    }

    /// Directory holding the key files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            eyre::bail!("Invalid storage key '{}'", key);
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(data))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // Write to a sibling temp file, then rename over the target
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_roundtrip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v1").unwrap();
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v2".to_string()));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_memory_quota() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set("a", "12345").unwrap();
        // Replacing a key only counts the new value
        storage.set("a", "1234567890").unwrap();
        assert!(storage.set("b", "x").is_err());
        assert_eq!(storage.get("b").unwrap(), None);
    }

    #[test]
    fn test_file_init_creates_dir() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::init(temp_dir.path()).unwrap();
        assert!(temp_dir.path().join(STORE_DIR).is_dir());
        assert_eq!(storage.dir(), temp_dir.path().join(STORE_DIR));
    }

    #[test]
    fn test_file_open_requires_init() {
        let temp_dir = TempDir::new().unwrap();
        assert!(FileStorage::open(temp_dir.path()).is_err());
        FileStorage::init(temp_dir.path()).unwrap();
        assert!(FileStorage::open(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_file_roundtrip_and_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let mut storage = FileStorage::init(temp_dir.path()).unwrap();
        storage.set("time_master_tasks", "[]").unwrap();

        let reopened = FileStorage::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.get("time_master_tasks").unwrap(), Some("[]".to_string()));
        assert!(!temp_dir.path().join(STORE_DIR).join("time_master_tasks.json.tmp").exists());

        storage.remove("time_master_tasks").unwrap();
        assert_eq!(reopened.get("time_master_tasks").unwrap(), None);
    }

    #[test]
    fn test_file_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut storage = FileStorage::init(temp_dir.path()).unwrap();
        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.get("").is_err());
    }
}
