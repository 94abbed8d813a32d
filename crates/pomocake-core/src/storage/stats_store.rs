//! Load/save hooks for statistics.
//!
//! The timer does not need persistence to work. [`MemoryStore`] keeps the
//! latest statistics for the life of the process only; [`JsonStatsStore`]
//! writes them to `stats.json` so they survive restarts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::data_dir;
use crate::error::{CoreError, StorageError};
use crate::stats::StatisticsTracker;

pub trait StatsStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<StatisticsTracker>, StorageError>;

    fn save(&self, stats: &StatisticsTracker) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<StatisticsTracker>>,
}

impl StatsStore for MemoryStore {
    fn load(&self) -> Result<Option<StatisticsTracker>, StorageError> {
        Ok(self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, stats: &StatisticsTracker) -> Result<(), StorageError> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(stats.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JsonStatsStore {
    path: PathBuf,
}

impl JsonStatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `stats.json` in the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open_default() -> Result<Self, CoreError> {
        Ok(Self::new(data_dir()?.join("stats.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsStore for JsonStatsStore {
    fn load(&self) -> Result<Option<StatisticsTracker>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::ReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    /// Writes to a sibling temp file first so a crash never leaves a torn
    /// `stats.json` behind.
    fn save(&self, stats: &StatisticsTracker) -> Result<(), StorageError> {
        let write_err = |source| StorageError::WriteFailed {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(stats).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn sample() -> StatisticsTracker {
        let today = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let mut stats = StatisticsTracker::new(today);
        stats.record_elapsed(Duration::from_secs(25 * 60), true, today);
        stats.record_pomodoro(today);
        stats
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStatsStore::new(dir.path().join("stats.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_stats_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStatsStore::new(dir.path().join("nested").join("stats.json"));
        let stats = sample();
        store.save(&stats).unwrap();
        assert_eq!(store.load().unwrap(), Some(stats));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn garbage_file_is_reported_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonStatsStore::new(&path);
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn memory_store_keeps_latest() {
        let store = MemoryStore::default();
        assert!(store.load().unwrap().is_none());
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap().unwrap().lifetime_pomodoros(), 1);
    }
}
