//! Storage record models for the persistence layer.
//!
//! These are kept apart from the domain types: the store only knows package ids
//! and timestamps, never labels or display names.

use serde::{Deserialize, Serialize};

/// One row of selection history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Package identifier; the primary key.
    pub package_id: String,

    /// Unix timestamp in milliseconds of the latest selection, `None` once cleared.
    pub last_selected: Option<i64>,

    /// Unix timestamp in milliseconds when the row was first inserted.
    pub created_at: i64,
}

impl HistoryRecord {
    /// Creates a row that has never been selected.
    ///
    /// # Examples
    ///
    /// ```
    /// use applang::storage::HistoryRecord;
    ///
    /// let record = HistoryRecord::new("org.example.notes");
    /// assert!(record.last_selected.is_none());
    /// ```
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            last_selected: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
