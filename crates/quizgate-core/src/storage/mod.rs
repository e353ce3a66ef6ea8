mod config;
pub mod database;

pub use config::{Config, FetchConfig, PreferencesConfig, QuizConfig, RepositoryConfig};
pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::{ConfigError, StorageError};

/// Key under which the last session completion time is stored (RFC 3339).
pub const LAST_COMPLETED_KEY: &str = "quizgate.last_completed_at";

/// Returns `~/.config/quizgate[-dev]/` based on QUIZGATE_ENV.
///
/// Set QUIZGATE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("QUIZGATE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("quizgate-dev")
    } else {
        base_dir.join("quizgate")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Persistent key-value store.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Volatile store for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Read the last completion timestamp.
pub fn last_completed(store: &dyn KeyValueStore) -> Result<Option<DateTime<Utc>>, StorageError> {
    let Some(raw) = store.get(LAST_COMPLETED_KEY)? else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| StorageError::CorruptValue {
            key: LAST_COMPLETED_KEY.into(),
            message: e.to_string(),
        })
}

pub fn record_completed(store: &mut dyn KeyValueStore, at: DateTime<Utc>) -> Result<(), StorageError> {
    store.set(LAST_COMPLETED_KEY, &at.to_rfc3339())
}

pub fn clear_completed(store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(LAST_COMPLETED_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_timestamp_roundtrips_through_store() {
        let mut store = MemoryStore::new();
        assert_eq!(last_completed(&store).unwrap(), None);
        let at = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        record_completed(&mut store, at).unwrap();
        assert_eq!(last_completed(&store).unwrap(), Some(at));
        clear_completed(&mut store).unwrap();
        assert_eq!(last_completed(&store).unwrap(), None);
    }

    #[test]
    fn corrupt_timestamp_is_reported() {
        let mut store = MemoryStore::new();
        store.set(LAST_COMPLETED_KEY, "yesterday").unwrap();
        assert!(matches!(
            last_completed(&store),
            Err(StorageError::CorruptValue { .. })
        ));
    }
}
