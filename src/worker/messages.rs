//! History worker message types.
//!
//! Requests and responses exchanged between async callers and the history
//! worker thread. Both sides are plain data so they can be logged verbatim.

use crate::storage::HistoryRecord;
use serde::{Deserialize, Serialize};

/// Requests handled by the history worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerMessage {
    /// Upsert the package's row, then stamp it as selected at `timestamp`.
    RecordSelection {
        /// Package that was selected.
        package_id: String,

        /// Unix timestamp in milliseconds.
        timestamp: i64,
    },

    /// List rows with a timestamp, most recent first.
    ListHistory,

    /// Clear every timestamp.
    ClearAll,
}

impl WorkerMessage {
    /// Creates a `RecordSelection` stamped with the current time.
    pub fn record_selection(package_id: impl Into<String>) -> Self {
        Self::RecordSelection {
            package_id: package_id.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Short name used in spans and error messages.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::RecordSelection { .. } => "record selection",
            Self::ListHistory => "list history",
            Self::ClearAll => "clear history",
        }
    }
}

/// Responses sent back by the history worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerResponse {
    /// The selection was stored.
    SelectionRecorded {
        /// Package that was stamped.
        package_id: String,
    },

    /// Rows in most-recent-first order.
    HistoryListed {
        records: Vec<HistoryRecord>,
    },

    /// Every timestamp was cleared.
    HistoryCleared,

    /// The operation failed.
    Error {
        /// Human-readable error message.
        message: String,
    },
}
