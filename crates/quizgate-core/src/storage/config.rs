//! TOML-based application configuration.
//!
//! Stores:
//! - Quiz policy (interval, attempts, review/cooldown/error timings)
//! - Question fetch retry budget and backoff
//! - Question repository endpoint
//! - Preferred tags and difficulties
//!
//! Configuration is stored at `~/.config/quizgate/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::question::QuestionFilter;
use crate::timer::{QuizSchedule, RetryPolicy};

/// Quiz policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Minutes between quizzes.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Review time after a correct answer before the page unblocks.
    #[serde(default = "default_review_secs")]
    pub review_secs: u64,
    /// Lockout after the last attempt is used up.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// How long the fetch error stays on screen before auto-unblocking.
    #[serde(default = "default_error_timeout_secs")]
    pub error_timeout_secs: u64,
    /// Countdown text during cooldown; `{seconds}` is replaced.
    #[serde(default = "default_cooldown_message")]
    pub cooldown_message: String,
}

/// Question fetch retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_first_retry_delay")]
    pub first_retry_delay_secs: u64,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Remote question repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
}

/// Preferred question selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferencesConfig {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulties: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/quizgate/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

// Default functions
fn default_interval_minutes() -> u32 {
    30
}
fn default_max_attempts() -> u32 {
    3
}
fn default_review_secs() -> u64 {
    10
}
fn default_cooldown_secs() -> u64 {
    15
}
fn default_error_timeout_secs() -> u64 {
    15
}
fn default_cooldown_message() -> String {
    "Out of attempts. The page unlocks in {seconds}s.".into()
}
fn default_fetch_attempts() -> u32 {
    3
}
fn default_first_retry_delay() -> u64 {
    2
}
fn default_retry_delay() -> u64 {
    3
}
fn default_request_timeout() -> u64 {
    10
}
fn default_table() -> String {
    "questions".into()
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            max_attempts: default_max_attempts(),
            review_secs: default_review_secs(),
            cooldown_secs: default_cooldown_secs(),
            error_timeout_secs: default_error_timeout_secs(),
            cooldown_message: default_cooldown_message(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_fetch_attempts(),
            first_retry_delay_secs: default_first_retry_delay(),
            retry_delay_secs: default_retry_delay(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            table: default_table(),
        }
    }
}

impl QuizConfig {
    /// Render the cooldown countdown text.
    pub fn cooldown_text(&self, seconds: u64) -> String {
        self.cooldown_message.replace("{seconds}", &seconds.to_string())
    }
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            first_retry_delay_secs: self.first_retry_delay_secs,
            retry_delay_secs: self.retry_delay_secs,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl PreferencesConfig {
    pub fn filter(&self) -> QuestionFilter {
        QuestionFilter {
            tags: self.tags.clone(),
            difficulties: self.difficulties.clone(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?
                    .into(),
            ),
            serde_json::Value::Array(_) => serde_json::Value::Array(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| serde_json::Value::String(s.to_string()))
                    .collect(),
            ),
            serde_json::Value::Object(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ if value.is_empty() => serde_json::Value::Null,
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    pub fn schedule(&self) -> QuizSchedule {
        QuizSchedule::new(self.quiz.interval_minutes)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.quiz.max_attempts, 3);
        assert_eq!(parsed.fetch.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(indoc! {r#"
            [quiz]
            review_secs = 5

            [preferences]
            tags = ["math", "science"]
        "#})
        .unwrap();
        assert_eq!(cfg.quiz.review_secs, 5);
        assert_eq!(cfg.quiz.cooldown_secs, 15);
        assert_eq!(cfg.repository.table, "questions");
        assert_eq!(cfg.preferences.filter().tags, vec!["math", "science"]);
    }

    #[test]
    fn get_and_set_by_dot_path() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get("quiz.interval_minutes").as_deref(), Some("30"));
        cfg.set("quiz.interval_minutes", "45").unwrap();
        assert_eq!(cfg.quiz.interval_minutes, 45);
        cfg.set("repository.base_url", "https://db.example.com").unwrap();
        assert_eq!(cfg.repository.base_url.as_deref(), Some("https://db.example.com"));
        cfg.set("preferences.tags", "math, history").unwrap();
        assert_eq!(cfg.preferences.tags, vec!["math", "history"]);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_value() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("quiz.nope", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            cfg.set("quiz.review_secs", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn cooldown_text_substitutes_seconds() {
        assert_eq!(
            QuizConfig::default().cooldown_text(7),
            "Out of attempts. The page unlocks in 7s."
        );
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }
}
