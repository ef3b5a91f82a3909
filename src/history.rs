//! Selection history.
//!
//! [`HistoryTracker`] is the async face of the history worker. Every call is
//! one round trip over the worker's queue, so a `clear_all` that has returned
//! is visible to the very next `list_history`.
//!
//! # Examples
//!
//! ```no_run
//! use applang::history::HistoryTracker;
//!
//! # async fn demo() -> applang::Result<()> {
//! let history = HistoryTracker::open("/tmp/applang/history.json".into())?;
//! history.record_selection("org.example.notes").await?;
//! let rows = history.list_history().await?;
//! assert_eq!(rows[0].package_id, "org.example.notes");
//! # Ok(())
//! # }
//! ```

use crate::domain::{ApplangError, ApplicationRecord, Result};
use crate::storage::{HistoryRecord, HistoryStore, JsonHistoryStore};
use crate::worker::{Envelope, HistoryWorker, WorkerMessage, WorkerResponse};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

/// Async client for the history worker.
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    sender: mpsc::Sender<Envelope>,
}

impl HistoryTracker {
    /// Starts a worker over `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn spawn(store: Box<dyn HistoryStore>) -> Result<Self> {
        let sender = HistoryWorker::new(store).spawn()?;
        Ok(Self { sender })
    }

    /// Opens the JSON store at `path` and starts a worker over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the thread spawned.
    pub fn open(path: PathBuf) -> Result<Self> {
        Self::spawn(Box::new(JsonHistoryStore::new(path)?))
    }

    async fn request(&self, message: WorkerMessage) -> Result<WorkerResponse> {
        let operation = message.operation();
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope { message, reply })
            .await
            .map_err(|_| ApplangError::Worker(format!("{operation}: history worker stopped")))?;
        let response = response
            .await
            .map_err(|_| ApplangError::Worker(format!("{operation}: no reply from history worker")))?;

        match response {
            WorkerResponse::Error { message } => Err(ApplangError::Storage(message)),
            other => Ok(other),
        }
    }

    /// Upserts `package_id` and stamps it with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails or the worker is gone.
    pub async fn record_selection(&self, package_id: &str) -> Result<()> {
        match self
            .request(WorkerMessage::record_selection(package_id))
            .await?
        {
            WorkerResponse::SelectionRecorded { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Rows with a timestamp, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails or the worker is gone.
    pub async fn list_history(&self) -> Result<Vec<HistoryRecord>> {
        match self.request(WorkerMessage::ListHistory).await? {
            WorkerResponse::HistoryListed { records } => Ok(records),
            other => Err(unexpected(&other)),
        }
    }

    /// Clears every timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails or the worker is gone.
    pub async fn clear_all(&self) -> Result<()> {
        match self.request(WorkerMessage::ClearAll).await? {
            WorkerResponse::HistoryCleared => Ok(()),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(response: &WorkerResponse) -> ApplangError {
    ApplangError::Worker(format!("unexpected worker response: {response:?}"))
}

/// Resolves history rows against the directory, dropping unknown packages.
///
/// Keeps the history's most-recent-first order.
#[must_use]
pub fn join_with_directory(
    history: &[HistoryRecord],
    directory: &[ApplicationRecord],
) -> Vec<ApplicationRecord> {
    let by_id: HashMap<&str, &ApplicationRecord> = directory
        .iter()
        .map(|record| (record.package_id.as_str(), record))
        .collect();
    history
        .iter()
        .filter_map(|row| by_id.get(row.package_id.as_str()).map(|r| (*r).clone()))
        .collect()
}
