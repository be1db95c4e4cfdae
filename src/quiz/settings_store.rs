use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::QuizError;

/// Flat key-value settings. Every value is a scalar; writes are independent of each other.
pub trait SettingsStore: Send + Sync {
    /// Missing keys read as 0.
    fn integer(&self, key: &str) -> i64;
    fn set_integer(&self, key: &str, value: i64) -> Result<(), QuizError>;
    fn date(&self, key: &str) -> Option<DateTime<Utc>>;
    fn set_date(&self, key: &str, value: DateTime<Utc>) -> Result<(), QuizError>;
}

/// Settings kept as one JSON object on disk, rewritten on every set.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QuizError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw).map_err(QuizError::CorruptStore)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("opened settings at {} ({} keys)", path.display(), values.len());
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// The in-memory value only changes once the new file is in place.
    fn set(&self, key: &str, value: Value) -> Result<(), QuizError> {
        let mut values = self.values.lock();
        let mut updated = values.clone();
        updated.insert(key.to_string(), value);
        let raw = serde_json::to_vec_pretty(&updated).map_err(QuizError::CorruptStore)?;

        let mut tmp_name = self.path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, raw)?;
        fs::rename(&tmp_path, &self.path)?;

        *values = updated;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn integer(&self, key: &str) -> i64 {
        self.values
            .lock()
            .get(key)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    fn set_integer(&self, key: &str, value: i64) -> Result<(), QuizError> {
        self.set(key, Value::from(value))
    }

    fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        let values = self.values.lock();
        let raw = values.get(key)?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }

    fn set_date(&self, key: &str, value: DateTime<Utc>) -> Result<(), QuizError> {
        self.set(key, Value::from(value.to_rfc3339()))
    }
}

/// In-memory store, handy for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    integers: Mutex<HashMap<String, i64>>,
    dates: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn integer(&self, key: &str) -> i64 {
        self.integers.lock().get(key).copied().unwrap_or(0)
    }

    fn set_integer(&self, key: &str, value: i64) -> Result<(), QuizError> {
        self.integers.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        self.dates.lock().get(key).copied()
    }

    fn set_date(&self, key: &str, value: DateTime<Utc>) -> Result<(), QuizError> {
        self.dates.lock().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("stats.json")).unwrap();
        assert_eq!(store.integer("gamesCount"), 0);
        assert!(store.date("bestGame").is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap();

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set_integer("42.gamesCount", 3).unwrap();
            store.set_date("42.bestGame", date).unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.integer("42.gamesCount"), 3);
        assert_eq!(store.date("42.bestGame"), Some(date));
        assert_eq!(store.integer("7.gamesCount"), 0);
    }

    #[test]
    fn test_failed_write_keeps_old_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set_integer("1.gamesCount", 2).unwrap();

        // Pull the directory out from under the store so the next write fails.
        drop(dir);
        assert!(store.set_integer("1.gamesCount", 3).is_err());
        assert_eq!(store.integer("1.gamesCount"), 2);
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set_integer("1.correct", 7).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("stats.json")]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(
            JsonFileStore::open(&path),
            Err(QuizError::CorruptStore(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set_integer("correct", 12).unwrap();
        assert_eq!(store.integer("correct"), 12);
        assert_eq!(store.integer("other"), 0);
    }
}
