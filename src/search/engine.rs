//! Debounced, cancellable search.
//!
//! Every submission gets a fresh generation number and aborts whatever task
//! the previous submission spawned. A debounced submission sleeps first
//! (`Pending`), then filters (`Running`); an immediate one filters right away.
//! Before publishing, the task checks that its generation is still the latest
//! and hands the sink a guard that repeats the check at apply time, so a
//! result from an older query can never replace a newer one.
//!
//! ```text
//!           submit(Debounced)            debounce elapsed
//!   Idle ───────────────────▶ Pending ───────────────────▶ Running ──▶ Complete
//!     │                          ▲                            ▲
//!     └──── submit(Immediate) ───┼────────────────────────────┘
//!                                └── any submit restarts here or at Running
//! ```

use super::filter::{filter, FacetSelection};
use crate::domain::{ApplangError, ApplicationRecord};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Directories at least this large are filtered on the blocking pool.
pub const OFFLOAD_THRESHOLD: usize = 256;

/// Lifecycle of the latest search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPhase {
    #[default]
    Idle,
    Pending,
    Running,
    Complete,
}

/// How a submission should be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Typing: wait for the debounce window.
    Debounced,
    /// Confirm, facet toggle, collapse: run now.
    Immediate,
}

/// Everything one search run needs, captured at submission time.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub directory: Arc<Vec<ApplicationRecord>>,
    pub query: String,
    pub facets: FacetSelection,
}

type FilterFn = fn(&[ApplicationRecord], &str, &FacetSelection) -> Vec<ApplicationRecord>;

/// Receives finished results.
pub trait SearchSink: Send + Sync {
    /// Applies `results` if `still_current()` holds at the moment of applying.
    ///
    /// Returns `true` if the results were applied.
    fn publish(&self, results: Vec<ApplicationRecord>, still_current: &dyn Fn() -> bool) -> bool;
}

/// Runs searches against a [`SearchSink`].
pub struct SearchEngine {
    generation: Arc<AtomicU64>,
    phase: Arc<watch::Sender<SearchPhase>>,
    task: Mutex<Option<JoinHandle<()>>>,
    debounce: Duration,
    sink: Arc<dyn SearchSink>,
    filter: FilterFn,
}

impl SearchEngine {
    #[must_use]
    pub fn new(sink: Arc<dyn SearchSink>, debounce: Duration) -> Self {
        let (phase, _) = watch::channel(SearchPhase::Idle);
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            phase: Arc::new(phase),
            task: Mutex::new(None),
            debounce,
            sink,
            filter,
        }
    }

    #[cfg(test)]
    fn with_filter(sink: Arc<dyn SearchSink>, debounce: Duration, filter: FilterFn) -> Self {
        let mut engine = Self::new(sink, debounce);
        engine.filter = filter;
        engine
    }

    /// Current phase of the latest search.
    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        *self.phase.borrow()
    }

    /// Watches phase changes.
    #[must_use]
    pub fn subscribe_phase(&self) -> watch::Receiver<SearchPhase> {
        self.phase.subscribe()
    }

    /// Generation of the most recent submission.
    #[must_use]
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cancels any in-flight search and schedules `request`.
    ///
    /// Must be called from within a tokio runtime. Returns the new generation.
    pub fn submit(&self, request: SearchRequest, trigger: Trigger) -> u64 {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let initial = match trigger {
            Trigger::Debounced => SearchPhase::Pending,
            Trigger::Immediate => SearchPhase::Running,
        };
        self.phase.send_replace(initial);

        let run = SearchRun {
            generation,
            latest: Arc::clone(&self.generation),
            phase: Arc::clone(&self.phase),
            sink: Arc::clone(&self.sink),
            filter: self.filter,
        };
        let debounce = match trigger {
            Trigger::Debounced => Some(self.debounce),
            Trigger::Immediate => None,
        };
        let span = tracing::debug_span!("search", generation = generation, trigger = ?trigger);
        *task = Some(tokio::spawn(run.execute(request, debounce).instrument(span)));
        generation
    }

    /// Cancels any in-flight search without starting a new one.
    pub fn cancel(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = task.take() {
            previous.abort();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.phase.send_replace(SearchPhase::Idle);
    }
}

impl Drop for SearchEngine {
    fn drop(&mut self) {
        if let Some(task) = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

struct SearchRun {
    generation: u64,
    latest: Arc<AtomicU64>,
    phase: Arc<watch::Sender<SearchPhase>>,
    sink: Arc<dyn SearchSink>,
    filter: FilterFn,
}

impl SearchRun {
    fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    fn advance(&self, phase: SearchPhase) {
        self.phase.send_if_modified(|current| {
            if self.is_current() && *current != phase {
                *current = phase;
                true
            } else {
                false
            }
        });
    }

    fn stale(&self) -> ApplangError {
        ApplangError::StaleResult {
            generation: self.generation,
            latest: self.latest.load(Ordering::SeqCst),
        }
    }

    async fn execute(self, request: SearchRequest, debounce: Option<Duration>) {
        if let Some(delay) = debounce {
            tokio::time::sleep(delay).await;
            if !self.is_current() {
                tracing::debug!(error = %self.stale(), "dropped after debounce");
                return;
            }
            self.advance(SearchPhase::Running);
        }

        let size = request.directory.len();
        let results = if size >= OFFLOAD_THRESHOLD {
            let SearchRequest {
                directory,
                query,
                facets,
            } = request;
            let filter = self.filter;
            match tokio::task::spawn_blocking(move || filter(&directory, &query, &facets)).await {
                Ok(results) => results,
                Err(e) => {
                    tracing::warn!(error = %e, "filter task failed");
                    self.advance(SearchPhase::Idle);
                    return;
                }
            }
        } else {
            (self.filter)(&request.directory, &request.query, &request.facets)
        };

        let count = results.len();
        if self.sink.publish(results, &|| self.is_current()) {
            self.advance(SearchPhase::Complete);
            tracing::debug!(directory = size, results = count, "search published");
        } else {
            tracing::debug!(error = %self.stale(), "search result discarded");
        }
    }
}
