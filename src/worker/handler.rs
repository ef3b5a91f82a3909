//! History worker thread.
//!
//! The worker owns the [`HistoryStore`] outright and runs on a dedicated OS
//! thread, so blocking file I/O never lands on the async runtime. Callers talk
//! to it through a bounded channel; each request carries a oneshot for its
//! reply. The thread exits once every sender is dropped, and the store's own
//! drop handler flushes anything still dirty.

use crate::domain::error::Result;
use crate::storage::backend::HistoryStore;
use crate::storage::models::HistoryRecord;
use crate::worker::{WorkerMessage, WorkerResponse};
use tokio::sync::{mpsc, oneshot};

/// Capacity of the request queue.
pub const QUEUE_DEPTH: usize = 32;

/// A request plus the channel its reply goes to.
#[derive(Debug)]
pub struct Envelope {
    pub message: WorkerMessage,
    pub reply: oneshot::Sender<WorkerResponse>,
}

/// Worker state: just the store.
pub struct HistoryWorker {
    store: Box<dyn HistoryStore>,
}

impl HistoryWorker {
    #[must_use]
    pub fn new(store: Box<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Starts the worker on its own thread and returns the request sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn(self) -> Result<mpsc::Sender<Envelope>> {
        let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
        std::thread::Builder::new()
            .name("applang-history".to_string())
            .spawn(move || self.run(receiver))?;
        Ok(sender)
    }

    fn run(mut self, mut receiver: mpsc::Receiver<Envelope>) {
        tracing::debug!("history worker started");
        while let Some(Envelope { message, reply }) = receiver.blocking_recv() {
            let response = self.handle_message(message);
            if reply.send(response).is_err() {
                tracing::debug!("requester dropped before reply");
            }
        }
        tracing::debug!("history worker stopped");
    }

    /// Standardizes error handling and success logging across operations.
    fn handle_db_result<T, F>(operation: &str, result: Result<T>, on_success: F) -> WorkerResponse
    where
        F: FnOnce(T) -> WorkerResponse,
    {
        match result {
            Ok(value) => {
                tracing::debug!(operation = operation, "storage operation successful");
                on_success(value)
            }
            Err(e) => {
                tracing::debug!(operation = operation, error = %e, "storage operation failed");
                WorkerResponse::Error {
                    message: format!("{operation}: {e}"),
                }
            }
        }
    }

    fn upsert_and_stamp(&mut self, package_id: &str, timestamp: i64) -> Result<()> {
        if self.store.find_by_package(package_id)?.is_none() {
            self.store.insert(&HistoryRecord::new(package_id))?;
        }
        self.store.set_last_selected(package_id, timestamp)
    }

    fn handle_record_selection(&mut self, package_id: String, timestamp: i64) -> WorkerResponse {
        let result = self.upsert_and_stamp(&package_id, timestamp);
        Self::handle_db_result("record selection", result, |()| {
            tracing::debug!(package_id = %package_id, timestamp = timestamp, "selection recorded");
            WorkerResponse::SelectionRecorded { package_id }
        })
    }

    fn handle_list_history(&self) -> WorkerResponse {
        Self::handle_db_result(
            "list history",
            self.store.list_by_last_selected_desc(),
            |records| WorkerResponse::HistoryListed { records },
        )
    }

    fn handle_clear_all(&mut self) -> WorkerResponse {
        Self::handle_db_result("clear history", self.store.clear_last_selected_all(), |()| {
            WorkerResponse::HistoryCleared
        })
    }

    /// Processes one request.
    pub fn handle_message(&mut self, message: WorkerMessage) -> WorkerResponse {
        let _span =
            tracing::debug_span!("worker_handle_message", operation = message.operation()).entered();

        match message {
            WorkerMessage::RecordSelection {
                package_id,
                timestamp,
            } => self.handle_record_selection(package_id, timestamp),
            WorkerMessage::ListHistory => self.handle_list_history(),
            WorkerMessage::ClearAll => self.handle_clear_all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonHistoryStore;

    fn worker() -> (tempfile::TempDir, HistoryWorker) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("history.json")).unwrap();
        (dir, HistoryWorker::new(Box::new(store)))
    }

    fn listed(response: WorkerResponse) -> Vec<(String, Option<i64>)> {
        match response {
            WorkerResponse::HistoryListed { records } => records
                .into_iter()
                .map(|r| (r.package_id, r.last_selected))
                .collect(),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn repeated_selection_keeps_one_row_with_latest_stamp() {
        let (_dir, mut worker) = worker();
        for timestamp in [100, 200] {
            worker.handle_message(WorkerMessage::RecordSelection {
                package_id: "org.example.a".to_string(),
                timestamp,
            });
        }

        let rows = listed(worker.handle_message(WorkerMessage::ListHistory));
        assert_eq!(rows, [("org.example.a".to_string(), Some(200))]);
    }

    #[test]
    fn clear_all_empties_the_listing() {
        let (_dir, mut worker) = worker();
        worker.handle_message(WorkerMessage::record_selection("org.example.a"));

        assert_eq!(
            worker.handle_message(WorkerMessage::ClearAll),
            WorkerResponse::HistoryCleared
        );
        assert!(listed(worker.handle_message(WorkerMessage::ListHistory)).is_empty());
    }

    #[tokio::test]
    async fn spawned_worker_answers_over_channel() {
        let (_dir, worker) = worker();
        let sender = worker.spawn().unwrap();

        let (reply, response) = oneshot::channel();
        sender
            .send(Envelope {
                message: WorkerMessage::record_selection("org.example.a"),
                reply,
            })
            .await
            .unwrap();

        assert_eq!(
            response.await.unwrap(),
            WorkerResponse::SelectionRecorded {
                package_id: "org.example.a".to_string()
            }
        );
    }
}
