//! Storage backend abstraction.
//!
//! The [`HistoryStore`] trait is deliberately narrow: each method maps to one
//! step of the history tracker's use cases, not to a generic table API.

use crate::domain::error::Result;
use crate::storage::models::HistoryRecord;

/// Abstraction over selection-history persistence.
///
/// # Implementations
///
/// - [`crate::storage::JsonHistoryStore`]: JSON file with atomic writes
pub trait HistoryStore: Send {
    /// Looks up the row for `package_id`. `Ok(None)` if it was never recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn find_by_package(&self, package_id: &str) -> Result<Option<HistoryRecord>>;

    /// Inserts a new row. Inserting an existing key keeps the existing row.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn insert(&mut self, record: &HistoryRecord) -> Result<()>;

    /// Stamps `package_id` as selected at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or the write fails.
    fn set_last_selected(&mut self, package_id: &str, timestamp: i64) -> Result<()>;

    /// Clears the timestamp of every row.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn clear_last_selected_all(&mut self) -> Result<()>;

    /// Lists rows with a timestamp, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_by_last_selected_desc(&self) -> Result<Vec<HistoryRecord>>;
}
