//! Core data model types for ingestion.
//!
//! An ingestion run produces one [`BatchSummary`]; the datastore holds [`BatchRecord`]s and
//! their [`StoredRow`]s, each row carrying an opaque [`RowDocument`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One data row, keyed by normalized column key.
///
/// The key set is discovered from each export's header row, so rows are dynamic documents
/// rather than a fixed schema. Serialized as a JSON object with sorted keys.
pub type RowDocument = BTreeMap<String, String>;

/// Result of a committed ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Identifier assigned by the datastore.
    pub id: i64,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    /// Basename of the export file.
    pub filename: String,
    /// Number of persisted (non-blank) rows.
    pub rows: usize,
}

/// A committed batch as read back from the datastore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub id: i64,
    pub range_start: String,
    pub range_end: String,
    pub filename: String,
    /// UTC, RFC3339.
    pub created_at: String,
}

/// A persisted row as read back from the datastore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRow {
    pub id: i64,
    pub batch_id: i64,
    pub row_index: i64,
    pub data: RowDocument,
}
