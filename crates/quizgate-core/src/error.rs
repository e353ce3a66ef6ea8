//! Core error types for quizgate-core.
//!
//! This module defines the error hierarchy using thiserror. Fetch errors are
//! all retryable from the orchestrator's point of view; validation and
//! session errors are reported to the caller and never leave the page blocked.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for quizgate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Question acquisition errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Stored value could not be decoded
    #[error("Corrupt value for '{key}': {message}")]
    CorruptValue { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not determine the data directory
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),
}

/// Question acquisition errors. Every variant is retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure or undecodable response body
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Repository answered with a non-2xx status
    #[error("Repository returned HTTP {status}")]
    Status { status: u16 },

    /// Neither the filtered nor the unfiltered query returned rows
    #[error("No question rows available")]
    NoRows,

    /// The selected row failed shape validation
    #[error("Invalid question row {id}: {reason}")]
    InvalidRow { id: String, reason: String },

    /// Repository endpoint is not configured
    #[error("Question repository is not configured: {0}")]
    NotConfigured(String),
}

impl FetchError {
    /// Whether the failure came from the transport rather than the data.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Status { .. })
    }
}

/// Question validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is blank
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// Too few usable choices for a single-choice question
    #[error("Single-choice question needs at least 2 choices, found {found}")]
    TooFewChoices { found: usize },

    /// Answer letter does not index into the choice list
    #[error("Answer '{answer}' is out of range for {len} choices")]
    AnswerOutOfRange { answer: String, len: usize },
}

/// Session lifecycle errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A session is already running
    #[error("A quiz session is already active (phase: {phase})")]
    AlreadyActive { phase: String },

    /// The session driver has shut down
    #[error("Session driver is no longer running")]
    DriverClosed,
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
            },
            None => FetchError::Transport(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
