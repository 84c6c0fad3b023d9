//! Core types for idempotent synchronization.

use serde::{Deserialize, Serialize};

/// Outcome of one source item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Created,
    Skipped,
    Errored,
}

/// Record of what happened to one source item during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Natural key rendered as text.
    pub external_id: String,
    /// Id of the destination record created or matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_page_id: Option<String>,
    pub status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncRecord {
    pub fn created(external_id: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            destination_page_id: Some(page_id.into()),
            status: SyncStatus::Created,
            error: None,
        }
    }

    pub fn skipped(external_id: impl Into<String>, page_id: Option<String>) -> Self {
        Self {
            external_id: external_id.into(),
            destination_page_id: page_id,
            status: SyncStatus::Skipped,
            error: None,
        }
    }

    pub fn errored(external_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            destination_page_id: None,
            status: SyncStatus::Errored,
            error: Some(error.into()),
        }
    }
}

/// Summary of a run for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRunResult {
    pub source: String,
    pub created: Vec<SyncRecord>,
    pub skipped: Vec<SyncRecord>,
    pub errors: Vec<SyncRecord>,
    /// Set when the fetch itself failed; the run then contributes nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl SyncRunResult {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, record: SyncRecord) {
        match record.status {
            SyncStatus::Created => self.created.push(record),
            SyncStatus::Skipped => self.skipped.push(record),
            SyncStatus::Errored => self.errors.push(record),
        }
    }

    pub fn total(&self) -> usize {
        self.created.len() + self.skipped.len() + self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        self.fetch_error.is_some() || !self.errors.is_empty()
    }
}

/// Step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Fetching,
    Transforming,
    Checking,
    Writing,
    Done,
}

/// Sync error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("{service} API error ({status}): {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Sink cannot write {0} payloads")]
    UnsupportedPayload(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub fn transform(message: impl Into<String>) -> Self {
        SyncError::Transform(message.into())
    }
}
