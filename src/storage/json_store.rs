//! Keyed JSON store with last-known-good semantics.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::StorageError;

/// Entity key → last successfully synced record.
///
/// Backed by a `BTreeMap` so the written file is stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncStore<R> {
    entries: BTreeMap<String, R>,
}

impl<R> Default for SyncStore<R> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<R> SyncStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, record: R) -> Option<R> {
        self.entries.insert(key.into(), record)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<R: DeserializeOwned> SyncStore<R> {
    /// Load a store from disk.
    ///
    /// A missing file yields an empty store. So does a file that fails to
    /// parse; it will be overwritten by the next successful run.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let contents = match fs::read(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No previous store at {:?}, starting empty", path);
                return Ok(Self::new());
            }
            Err(e) => return Err(StorageError::io(path, e)),
        };

        match serde_json::from_slice::<Self>(&contents) {
            Ok(store) => {
                debug!("Loaded {} entries from {:?}", store.len(), path);
                Ok(store)
            }
            Err(e) => {
                warn!("Previous store {:?} is corrupt ({}), starting empty", path, e);
                Ok(Self::new())
            }
        }
    }
}

impl<R: Serialize> SyncStore<R> {
    /// Write the store, replacing any existing file atomically.
    ///
    /// The JSON is written to a sibling temp file which is then renamed over
    /// the target, so readers never observe a half-written store.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| StorageError::io(&parent, e))?;

        let tmp_path = temp_path_for(path)?;
        if let Err(e) = self.write_to(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StorageError::io(path, e));
        }

        info!("Wrote {} entries to {:?}", self.len(), path);
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<(), StorageError> {
        let file = File::create(path).map_err(|e| StorageError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer).map_err(|e| StorageError::io(path, e))?;
        writer.flush().map_err(|e| StorageError::io(path, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| StorageError::io(path, e))?;
        Ok(())
    }
}

/// `prime_stats.json` → `.prime_stats.json.tmp` in the same directory.
fn temp_path_for(path: &Path) -> Result<PathBuf, StorageError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;
    Ok(path.with_file_name(format!(".{}.tmp", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestRecord {
        name: String,
        wins: u32,
    }

    fn record(name: &str, wins: u32) -> TestRecord {
        TestRecord {
            name: name.to_string(),
            wins,
        }
    }

    #[test]
    fn test_store_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prime_stats.json");

        let mut store = SyncStore::new();
        store.insert("prime", record("UIC Prime", 4));
        store.insert("spark", record("UIC Spark", 2));
        store.save(&path).unwrap();

        let loaded: SyncStore<TestRecord> = SyncStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.get("prime").unwrap().wins, 4);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let store: SyncStore<TestRecord> = SyncStore::load(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");
        fs::write(&path, "{ not json").unwrap();

        let store: SyncStore<TestRecord> = SyncStore::load(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_invalid_utf8_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prime_stats.json");
        fs::write(&path, [0xff, 0xfe, b'{', b'}']).unwrap();

        let store: SyncStore<TestRecord> = SyncStore::load(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_directory_is_error() {
        let temp_dir = TempDir::new().unwrap();

        let result: Result<SyncStore<TestRecord>, _> = SyncStore::load(temp_dir.path());
        assert!(matches!(result, Err(StorageError::Io { .. })));
    }

    #[test]
    fn test_load_wrong_shape_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");
        fs::write(&path, r#"{"prime": "DATA ERROR"}"#).unwrap();

        let store: SyncStore<TestRecord> = SyncStore::load(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prime_stats.json");
        fs::write(&path, "old").unwrap();

        let mut store = SyncStore::new();
        store.insert("nova", record("UIC Nova", 1));
        store.save(&path).unwrap();

        let loaded: SyncStore<TestRecord> = SyncStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!temp_dir.path().join(".prime_stats.json.tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("site").join("data.json");

        let mut store = SyncStore::new();
        store.insert("prime_top", record("UIC Speedy", 0));
        store.save(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_save_to_unwritable_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "file, not a dir").unwrap();
        let path = blocker.join("data.json");

        let store: SyncStore<TestRecord> = SyncStore::new();
        assert!(store.save(&path).is_err());
    }

    #[test]
    fn test_output_is_sorted_by_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");

        let mut store = SyncStore::new();
        store.insert("spark", record("b", 0));
        store.insert("abyss", record("a", 0));
        store.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.find("abyss").unwrap() < text.find("spark").unwrap());
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["abyss", "spark"]);
    }

    #[test]
    fn test_temp_path_for() {
        let tmp = temp_path_for(Path::new("/srv/site/data.json")).unwrap();
        assert_eq!(tmp, PathBuf::from("/srv/site/.data.json.tmp"));
    }
}
