//! Key-value persistence port
//!
//! Everything durable (high scores, difficulty choices, the sound flag) goes
//! through [`Storage`]: string keys, string values, usually JSON. Backends:
//! - [`MemoryStorage`]: in-process map (tests, headless runs)
//! - [`FileStorage`]: one JSON object on disk (native only)
//! - `platform::web::LocalStorage`: browser `localStorage` (wasm32 only)
//!
//! Readers never fail: missing or corrupt values load as `None`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value store
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value. Corrupt data is logged and treated as absent.
pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt value under {key:?}: {e}");
            None
        }
    }
}

/// Encode and write a JSON value
pub fn save_json<T: Serialize + ?Sized>(
    storage: &mut dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
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

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file, rewritten on every change
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStorage {
    path: std::path::PathBuf,
    entries: BTreeMap<String, String>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    /// Open (or start) the store at `path`. An unreadable file starts empty.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Store {} is corrupt, starting fresh: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::info!("Opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_basic() {
        let mut s = MemoryStorage::new();
        assert!(s.get("a").is_none());
        s.set("a", "1").unwrap();
        assert_eq!(s.get("a").as_deref(), Some("1"));
        s.remove("a").unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_load_json_corrupt_is_none() {
        let mut s = MemoryStorage::new();
        s.set("k", "{not json").unwrap();
        let v: Option<Vec<u32>> = load_json(&s, "k");
        assert!(v.is_none());
    }

    #[test]
    fn test_save_then_load_json() {
        let mut s = MemoryStorage::new();
        save_json(&mut s, "k", &vec![3u32, 1, 2]).unwrap();
        let v: Option<Vec<u32>> = load_json(&s, "k");
        assert_eq!(v, Some(vec![3, 1, 2]));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_storage_persists() {
        let path = std::env::temp_dir().join(format!(
            "retro-arcade-test-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        {
            let mut s = FileStorage::open(&path).unwrap();
            s.set("highScores", "{}").unwrap();
        }
        let s = FileStorage::open(&path).unwrap();
        assert_eq!(s.get("highScores").as_deref(), Some("{}"));
        let _ = std::fs::remove_file(&path);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_storage_corrupt_file_starts_empty() {
        let path = std::env::temp_dir().join(format!(
            "retro-arcade-corrupt-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "][").unwrap();
        let s = FileStorage::open(&path).unwrap();
        assert!(s.get("anything").is_none());
        let _ = std::fs::remove_file(&path);
    }
}
