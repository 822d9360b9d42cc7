//! Persisted sets of already-processed keys, one partition per action kind.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::action::ActionKind;
use crate::error::BatchError;

/// Directory the binary keeps progress files in
pub const DEFAULT_STATE_DIR: &str = "processed_state";

/// Per-action sets of keys that were already done
pub trait ProgressStore: Send + Sync {
    /// Keys recorded for `kind`; an unreadable partition is empty
    fn load(&self, kind: ActionKind) -> HashSet<String>;

    /// Replace the whole partition for `kind`
    fn save(&self, kind: ActionKind, keys: &HashSet<String>) -> Result<(), BatchError>;

    /// Forget every partition, returning how many were removed
    fn clear(&self) -> Result<usize, BatchError>;
}

/// One `processed_<kind>.json` file per kind inside a directory
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: ActionKind) -> PathBuf {
        self.dir.join(format!("processed_{}.json", kind.as_str()))
    }
}

impl Default for JsonDirStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_DIR)
    }
}

impl ProgressStore for JsonDirStore {
    fn load(&self, kind: ActionKind) -> HashSet<String> {
        let path = self.path_for(kind);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return HashSet::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read progress file, starting empty");
                return HashSet::new();
            }
        };
        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(keys) => {
                debug!(kind = %kind, count = keys.len(), "loaded processed keys");
                keys.into_iter().collect()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt progress file, starting empty");
                HashSet::new()
            }
        }
    }

    fn save(&self, kind: ActionKind, keys: &HashSet<String>) -> Result<(), BatchError> {
        fs::create_dir_all(&self.dir).map_err(|err| BatchError::write(&self.dir, err))?;

        let mut sorted: Vec<&String> = keys.iter().collect();
        sorted.sort();
        let json = serde_json::to_string_pretty(&sorted)?;

        let path = self.path_for(kind);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|err| BatchError::write(&tmp, err))?;
        fs::rename(&tmp, &path).map_err(|err| BatchError::write(&path, err))?;
        Ok(())
    }

    fn clear(&self) -> Result<usize, BatchError> {
        let mut removed = 0;
        for kind in ActionKind::ALL {
            let path = self.path_for(kind);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(BatchError::write(&path, err)),
            }
        }
        Ok(removed)
    }
}

/// In-process store that also counts saves
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: Mutex<HashMap<ActionKind, HashSet<String>>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys<I, S>(kind: ActionKind, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::default();
        store
            .lock_partitions()
            .insert(kind, keys.into_iter().map(Into::into).collect());
        store
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn contains(&self, kind: ActionKind, key: &str) -> bool {
        self.lock_partitions()
            .get(&kind)
            .is_some_and(|keys| keys.contains(key))
    }

    fn lock_partitions(&self) -> std::sync::MutexGuard<'_, HashMap<ActionKind, HashSet<String>>> {
        self.partitions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, kind: ActionKind) -> HashSet<String> {
        self.lock_partitions().get(&kind).cloned().unwrap_or_default()
    }

    fn save(&self, kind: ActionKind, keys: &HashSet<String>) -> Result<(), BatchError> {
        self.lock_partitions().insert(kind, keys.clone());
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }

    fn clear(&self) -> Result<usize, BatchError> {
        let mut partitions = self.lock_partitions();
        let removed = partitions.len();
        partitions.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn save_then_load_in_a_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state");
        JsonDirStore::new(&state)
            .save(ActionKind::Like, &keys(&["b", "a"]))
            .unwrap();

        let reopened = JsonDirStore::new(&state);
        assert_eq!(reopened.load(ActionKind::Like), keys(&["a", "b"]));
        assert!(reopened.load(ActionKind::Subscribe).is_empty());
    }

    #[test]
    fn file_is_a_sorted_pretty_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        store
            .save(ActionKind::Comment, &keys(&["zeta", "alpha"]))
            .unwrap();

        let path = dir.path().join("processed_comment.json");
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content, "[\n  \"alpha\",\n  \"zeta\"\n]");
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        fs::write(store.path_for(ActionKind::Subscribe), "{ not json").unwrap();
        assert!(store.load(ActionKind::Subscribe).is_empty());
    }

    #[test]
    fn clear_removes_existing_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        store.save(ActionKind::Like, &keys(&["a"])).unwrap();
        store.save(ActionKind::Comment, &keys(&["b"])).unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.load(ActionKind::Like).is_empty());
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[test]
    fn memory_store_counts_saves() {
        let store = MemoryStore::with_keys(ActionKind::Like, ["seen"]);
        assert!(store.contains(ActionKind::Like, "seen"));
        store.save(ActionKind::Like, &keys(&["seen", "new"])).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load(ActionKind::Like).len(), 2);
    }
}
