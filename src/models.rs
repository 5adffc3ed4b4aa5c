//! Core data models used throughout docqa.
//!
//! These types represent the windows, embedding records and ranked matches
//! that flow through the ingestion and retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contiguous line range `[start, end)` of a document plus its joined text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// One embedded window, with provenance. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingRecord {
    pub source_id: String,
    pub created_at: DateTime<Utc>,
    pub range_start: usize,
    pub range_end: usize,
    pub vector: Vec<f64>,
    pub text: String,
}

impl EmbeddingRecord {
    /// Build a record for `window` of `source_id`, stamped with the current time.
    pub fn new(source_id: &str, window: Window, vector: Vec<f64>) -> Self {
        Self {
            source_id: source_id.to_string(),
            created_at: Utc::now(),
            range_start: window.start,
            range_end: window.end,
            vector,
            text: window.text,
        }
    }
}

/// The persisted collection of all embedding records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingStore {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub records: Vec<EmbeddingRecord>,
}

impl EmbeddingStore {
    pub fn empty() -> Self {
        Self {
            created_at: Utc::now(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for EmbeddingStore {
    fn default() -> Self {
        Self::empty()
    }
}

/// A stored record paired with its distance to a query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch {
    pub record: EmbeddingRecord,
    pub distance: f64,
}
