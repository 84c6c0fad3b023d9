//! Core error types for lifelog-core.
//!
//! Configuration errors are the only class that is allowed to abort a run.
//! Everything the sync and aggregation paths encounter per item is folded
//! into structured results instead (see [`crate::sync::SyncRunResult`]).

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Core error type for lifelog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Errors raised by an external collaborator outside a sync run
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The source registry is internally inconsistent
    #[error("Invalid source registry: {0}")]
    Registry(String),

    /// The OS credential store refused a request
    #[error("Credential store error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Week number outside `[1, 53]`
    #[error("Week number {week} is out of range (expected 1..=53)")]
    WeekOutOfRange { week: u32 },

    /// Month outside `[1, 12]`
    #[error("Month {month} is out of range (expected 1..=12)")]
    MonthOutOfRange { month: u32 },

    /// Window whose end precedes its start
    #[error("Invalid window: end ({end}) is before start ({start})")]
    InvalidWindow {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Date lies more than one year before the context year's first week
    #[error("Date {date} lies before the first week of {context_year} and of the year before it")]
    DateBeforeContext {
        date: chrono::NaiveDate,
        context_year: i32,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
