//! Progress Store
//!
//! Per-chain key-value persistence for [`ProgressRecord`]s.
//!
//! None of the operations return errors. Unreadable storage or a corrupt
//! record degrades to a fresh record on load and to a logged no-op on
//! save/clear: losing local progress is acceptable, failing the run is not.
//!
//! Two writers on the same chain (two terminals) are last-write-wins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::constants::progress::KEY_PREFIX;
use crate::types::ProgressRecord;

/// Storage key for a chain's record
pub fn storage_key(chain_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, chain_id)
}

/// Load/save/clear contract used by the progression engine
pub trait ProgressStore {
    /// Persisted record, or a fresh one when missing or unreadable
    fn load(&self, chain_id: &str) -> ProgressRecord;

    /// Persist `record`, keeping the `started_at` of any readable stored record
    fn save(&self, chain_id: &str, record: &ProgressRecord);

    /// Remove the record entirely
    fn clear(&self, chain_id: &str);
}

impl<S: ProgressStore + ?Sized> ProgressStore for &S {
    fn load(&self, chain_id: &str) -> ProgressRecord {
        (**self).load(chain_id)
    }

    fn save(&self, chain_id: &str, record: &ProgressRecord) {
        (**self).save(chain_id, record)
    }

    fn clear(&self, chain_id: &str) {
        (**self).clear(chain_id)
    }
}

/// Parse a raw stored payload, logging and discarding anything unreadable
fn decode(chain_id: &str, raw: &str) -> Option<ProgressRecord> {
    match serde_json::from_str::<ProgressRecord>(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(chain_id, error = %e, "Discarding unreadable progress record");
            None
        }
    }
}

/// Apply the started-at preservation rule and serialize
fn encode(previous: Option<ProgressRecord>, record: &ProgressRecord) -> Option<String> {
    let mut to_store = record.clone();
    if let Some(previous) = previous {
        to_store.started_at = previous.started_at;
    }
    match serde_json::to_string(&to_store) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "Failed to serialize progress record");
            None
        }
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// One JSON file per chain under a directory
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, chain_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", storage_key(chain_id)))
    }

    fn read_raw(&self, chain_id: &str) -> Option<String> {
        let path = self.path_for(chain_id);
        match fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Progress storage unavailable");
                None
            }
        }
    }

    fn write_raw(&self, chain_id: &str, payload: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(chain_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &path)
    }

    /// Chain ids with a stored record
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let stem = name.strip_suffix(".json")?;
                stem.strip_prefix(KEY_PREFIX).map(str::to_string)
            })
            .collect();
        ids.sort();
        ids
    }

    /// Remove every stored record, returning how many were removed
    pub fn clear_all(&self) -> usize {
        let ids = self.list();
        for id in &ids {
            self.clear(id);
        }
        ids.len()
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self, chain_id: &str) -> ProgressRecord {
        self.read_raw(chain_id)
            .and_then(|raw| decode(chain_id, &raw))
            .unwrap_or_else(ProgressRecord::fresh)
    }

    fn save(&self, chain_id: &str, record: &ProgressRecord) {
        let previous = self
            .read_raw(chain_id)
            .and_then(|raw| decode(chain_id, &raw));
        let Some(payload) = encode(previous, record) else {
            return;
        };

        match self.write_raw(chain_id, &payload) {
            Ok(()) => debug!(chain_id, "Progress saved"),
            Err(e) => warn!(chain_id, error = %e, "Failed to save progress"),
        }
    }

    fn clear(&self, chain_id: &str) {
        let path = self.path_for(chain_id);
        match fs::remove_file(&path) {
            Ok(()) => debug!(chain_id, "Progress cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(chain_id, error = %e, "Failed to clear progress"),
        }
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Raw-string map, so corrupt payloads can be injected in tests
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw payload under a chain's key
    pub fn put_raw(&self, chain_id: &str, raw: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(storage_key(chain_id), raw.into());
        }
    }

    /// Raw payload stored for a chain
    pub fn get_raw(&self, chain_id: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(&storage_key(chain_id)).cloned())
    }

    pub fn contains(&self, chain_id: &str) -> bool {
        self.get_raw(chain_id).is_some()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, chain_id: &str) -> ProgressRecord {
        self.get_raw(chain_id)
            .and_then(|raw| decode(chain_id, &raw))
            .unwrap_or_else(ProgressRecord::fresh)
    }

    fn save(&self, chain_id: &str, record: &ProgressRecord) {
        let previous = self.get_raw(chain_id).and_then(|raw| decode(chain_id, &raw));
        if let Some(payload) = encode(previous, record) {
            self.put_raw(chain_id, payload);
        }
    }

    fn clear(&self, chain_id: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&storage_key(chain_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn record(current: usize, completed: &[usize]) -> ProgressRecord {
        ProgressRecord {
            current_step: current,
            completed_steps: completed.iter().copied().collect(),
            started_at: Utc::now(),
        }
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("abc"), "chain-progress-abc");
    }

    #[test]
    fn test_memory_load_missing_is_fresh() {
        let store = MemoryProgressStore::new();
        let loaded = store.load("missing");
        assert_eq!(loaded.current_step, 0);
        assert!(loaded.completed_steps.is_empty());
    }

    #[test]
    fn test_memory_corrupt_payload_is_fresh() {
        let store = MemoryProgressStore::new();
        store.put_raw("c1", "{not json");
        let loaded = store.load("c1");
        assert_eq!(loaded.current_step, 0);

        store.put_raw("c2", r#"{"currentStep":"two"}"#);
        assert!(store.load("c2").completed_steps.is_empty());
    }

    #[test]
    fn test_memory_save_preserves_started_at() {
        let store = MemoryProgressStore::new();
        let mut first = record(0, &[]);
        first.started_at = Utc::now() - Duration::days(3);
        store.save("c1", &first);

        let second = record(1, &[0]);
        store.save("c1", &second);

        let loaded = store.load("c1");
        assert_eq!(loaded.current_step, 1);
        assert_eq!(loaded.started_at, first.started_at);
    }

    #[test]
    fn test_memory_save_over_corrupt_uses_new_started_at() {
        let store = MemoryProgressStore::new();
        store.put_raw("c1", "garbage");
        let rec = record(2, &[0, 1]);
        store.save("c1", &rec);
        assert_eq!(store.load("c1"), rec);
    }

    #[test]
    fn test_memory_clear() {
        let store = MemoryProgressStore::new();
        store.save("c1", &record(1, &[0]));
        assert!(store.contains("c1"));
        store.clear("c1");
        assert!(!store.contains("c1"));
        store.clear("c1");
    }

    #[test]
    fn test_file_roundtrip_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileProgressStore::new(temp_dir.path().join("progress"));

        let rec = record(2, &[0, 1]);
        store.save("chain-a", &rec);
        assert_eq!(store.load("chain-a"), rec);
        assert!(
            temp_dir
                .path()
                .join("progress/chain-progress-chain-a.json")
                .exists()
        );

        store.clear("chain-a");
        assert_eq!(store.load("chain-a").current_step, 0);
    }

    #[test]
    fn test_file_corrupt_record_is_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileProgressStore::new(temp_dir.path());
        fs::write(temp_dir.path().join("chain-progress-x.json"), "\u{0}\u{1}").unwrap();

        let loaded = store.load("x");
        assert_eq!(loaded.current_step, 0);
        assert!(loaded.completed_steps.is_empty());
    }

    #[test]
    fn test_file_unwritable_dir_is_silent() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let store = FileProgressStore::new(blocker.join("progress"));
        store.save("c1", &record(1, &[0]));
        assert_eq!(store.load("c1").current_step, 0);
        store.clear("c1");
    }

    #[test]
    fn test_file_list_and_clear_all() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileProgressStore::new(temp_dir.path());
        store.save("b", &record(0, &[]));
        store.save("a", &record(0, &[]));
        fs::write(temp_dir.path().join("unrelated.txt"), "x").unwrap();

        assert_eq!(store.list(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.clear_all(), 2);
        assert!(store.list().is_empty());
    }
}
