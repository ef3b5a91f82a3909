//! Session orchestration.
//!
//! [`Session`] is the only writer of [`SessionState`]. It wires the probe, the
//! locale service, the directory builder, the search engine, and the history
//! tracker together and turns user intents into state replacements.
//!
//! Directory builds follow the same generation discipline as searches: a build
//! that finishes after a newer one was started is dropped instead of
//! published. The session never writes the operation mode itself; it only
//! mirrors what the probe decided.
//!
//! Every path that changes search inputs holds the search lock from the state
//! change through submission, so the newest generation always carries the
//! newest inputs.

use super::state::{Notification, SessionState};
use crate::directory::DirectoryBuilder;
use crate::domain::{AppLabel, ApplangError, LocaleOverride, OperationMode, Result};
use crate::history::{join_with_directory, HistoryTracker};
use crate::privilege::{ChannelProbe, PrivilegedLocaleService};
use crate::search::{
    QueryInput, SearchEngine, SearchPhase, SearchRequest, SearchSink, Trigger,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

/// Collaborators a [`Session`] is built from.
pub struct SessionParts {
    pub probe: Arc<ChannelProbe>,
    pub locales: Arc<PrivilegedLocaleService>,
    pub builder: Arc<DirectoryBuilder>,
    pub history: HistoryTracker,
    pub debounce: Duration,
}

/// Publishes search results into the session state.
struct StateSink {
    state: Arc<watch::Sender<SessionState>>,
}

impl SearchSink for StateSink {
    fn publish(
        &self,
        results: Vec<crate::domain::ApplicationRecord>,
        still_current: &dyn Fn() -> bool,
    ) -> bool {
        let mut results = Some(results);
        self.state.send_if_modified(|state| {
            if !still_current() {
                return false;
            }
            match results.take() {
                Some(results) => {
                    state.search_results = Arc::new(results);
                    true
                }
                None => false,
            }
        })
    }
}

struct Inner {
    state: Arc<watch::Sender<SessionState>>,
    probe: Arc<ChannelProbe>,
    locales: Arc<PrivilegedLocaleService>,
    builder: Arc<DirectoryBuilder>,
    history: HistoryTracker,
    search: SearchEngine,
    search_lock: Mutex<()>,
    build_generation: AtomicU64,
}

/// Handle to one interactive session. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    #[must_use]
    pub fn new(parts: SessionParts) -> Self {
        let state = Arc::new(watch::Sender::new(SessionState {
            operation_mode: parts.probe.current(),
            ..SessionState::default()
        }));
        let sink = Arc::new(StateSink {
            state: Arc::clone(&state),
        });
        Self {
            inner: Arc::new(Inner {
                search: SearchEngine::new(sink, parts.debounce),
                state,
                probe: parts.probe,
                locales: parts.locales,
                builder: parts.builder,
                history: parts.history,
                search_lock: Mutex::new(()),
                build_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Watches state replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Clones the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn search_phase(&self) -> SearchPhase {
        self.inner.search.phase()
    }

    /// Watches search phase changes.
    #[must_use]
    pub fn subscribe_search_phase(&self) -> watch::Receiver<SearchPhase> {
        self.inner.search.subscribe_phase()
    }

    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut SessionState),
    {
        self.inner.state.send_modify(mutate);
    }

    fn note_failure(&self, error: &ApplangError) {
        if error.is_privilege_lost() {
            self.update(|state| state.privilege_lost = true);
        }
    }

    fn search_guard(&self) -> MutexGuard<'_, ()> {
        self.inner
            .search_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Submits the current inputs. Callers hold [`Self::search_guard`].
    fn rerun_search(&self, trigger: Trigger) -> u64 {
        let request = {
            let state = self.inner.state.borrow();
            SearchRequest {
                directory: Arc::clone(&state.directory),
                query: state.query.clone(),
                facets: state.facets.clone(),
            }
        };
        self.inner.search.submit(request, trigger)
    }

    /// Runs the probe and mirrors its result into the state.
    pub async fn resolve_mode(&self) -> OperationMode {
        let mode = self.inner.probe.resolve_mode().await;
        self.update(|state| {
            state.operation_mode = mode;
            state.privilege_lost = false;
        });
        mode
    }

    /// Re-probes and rebuilds the directory with whatever channel is found.
    ///
    /// # Errors
    ///
    /// Same as [`Self::refresh_directory`].
    pub async fn retry_privilege(&self) -> Result<OperationMode> {
        let mode = self.resolve_mode().await;
        self.refresh_directory().await?;
        Ok(mode)
    }

    /// Rebuilds the whole directory, then reruns the search and history join.
    ///
    /// Probes first if no elevated channel is known yet. A build superseded by
    /// a newer one returns `Ok(())` without touching the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the package collaborator cannot list applications.
    pub async fn refresh_directory(&self) -> Result<()> {
        let generation = self.inner.build_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.update(|state| state.is_loading = true);

        if !self.inner.probe.current().is_privileged() {
            self.resolve_mode().await;
        }

        let outcome = self
            .inner
            .builder
            .build_directory()
            .instrument(tracing::debug_span!("refresh_directory", generation = generation))
            .await;

        let latest = self.inner.build_generation.load(Ordering::SeqCst);
        if latest != generation {
            let stale = ApplangError::StaleResult { generation, latest };
            tracing::debug!(error = %stale, "directory build discarded");
            return Ok(());
        }

        let build = match outcome {
            Ok(build) => build,
            Err(e) => {
                self.update(|state| state.is_loading = false);
                return Err(e);
            }
        };

        let mode = self.inner.probe.current();
        {
            let _search = self.search_guard();
            self.update(|state| {
                state.directory = Arc::new(build.records);
                state.is_loading = false;
                state.operation_mode = mode;
                state.privilege_lost |= build.privilege_lost;
            });
            self.rerun_search(Trigger::Immediate);
        }

        if let Err(e) = self.refresh_history().await {
            tracing::warn!(error = %e, "history refresh failed after rebuild");
        }
        Ok(())
    }

    /// Applies typed query text.
    ///
    /// Typing is debounced; a line break in the input confirms immediately.
    /// Input identical to the current query is ignored unless it confirms.
    pub fn set_query(&self, raw: &str) {
        let input = QueryInput::parse(raw);
        let _search = self.search_guard();
        let mut changed = false;
        self.inner.state.send_if_modified(|state| {
            if state.query == input.text {
                return false;
            }
            state.query.clone_from(&input.text);
            changed = true;
            true
        });

        if input.submitted {
            self.rerun_search(Trigger::Immediate);
        } else if changed {
            self.rerun_search(Trigger::Debounced);
        }
    }

    /// Runs the current query now, skipping the debounce.
    pub fn confirm_query(&self) {
        let _search = self.search_guard();
        self.rerun_search(Trigger::Immediate);
    }

    /// Flips a facet and reruns the search without debounce.
    ///
    /// Returns whether the facet is now selected.
    pub fn toggle_facet(&self, label: AppLabel) -> bool {
        let _search = self.search_guard();
        let mut selected = false;
        self.update(|state| selected = state.facets.toggle(label));
        self.rerun_search(Trigger::Immediate);
        selected
    }

    /// Expands or collapses the search panel.
    ///
    /// Expanding refreshes history. Collapsing clears the query and filters
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the history refresh on expand fails.
    pub async fn set_expanded(&self, expanded: bool) -> Result<()> {
        if expanded {
            self.update(|state| state.is_expanded = true);
            self.refresh_history().await
        } else {
            let _search = self.search_guard();
            self.update(|state| {
                state.is_expanded = false;
                state.query.clear();
            });
            self.rerun_search(Trigger::Immediate);
            Ok(())
        }
    }

    /// Reloads history and joins it against the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the history store cannot be read.
    pub async fn refresh_history(&self) -> Result<()> {
        let rows = self.inner.history.list_history().await?;
        self.update(|state| state.history = join_with_directory(&rows, &state.directory));
        Ok(())
    }

    /// Remembers `package_id` as last selected and records it in history.
    ///
    /// # Errors
    ///
    /// Returns [`ApplangError::Package`] for a package not in the directory, or
    /// a storage error from the history tracker.
    pub async fn select_app(&self, package_id: &str) -> Result<()> {
        let record = {
            let state = self.inner.state.borrow();
            state
                .index_of(package_id)
                .map(|index| state.directory[index].clone())
        }
        .ok_or_else(|| ApplangError::Package(format!("not in directory: {package_id}")))?;

        self.update(|state| state.last_selected = Some(record));
        self.inner.history.record_selection(package_id).await?;
        self.refresh_history().await
    }

    /// Clears every history timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the history store cannot be written.
    pub async fn clear_history(&self) -> Result<()> {
        self.inner.history.clear_all().await?;
        self.update(|state| state.history.clear());
        Ok(())
    }

    /// Re-reads one app's labels and repositions it if they changed.
    ///
    /// Returns the notification raised, or `None` for a no-op.
    ///
    /// # Errors
    ///
    /// Returns the privileged read's error; a lost channel also flags the state.
    pub async fn refresh_record(&self, package_id: &str) -> Result<Option<Notification>> {
        let record = match self.inner.builder.load_record(package_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.note_failure(&e);
                return Err(e);
            }
        };

        let _search = self.search_guard();
        let mut outcome = None;
        self.inner.state.send_if_modified(|state| {
            outcome = state.replace_record(record);
            outcome.is_some()
        });

        if let Some(notification) = outcome {
            tracing::debug!(package_id = %package_id, notification = ?notification, "record refreshed");
            self.rerun_search(Trigger::Immediate);
        }
        Ok(outcome)
    }

    /// Refreshes the last selected app, typically after returning from it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::refresh_record`].
    pub async fn reload_last_selected(&self) -> Result<Option<Notification>> {
        let package_id = self
            .inner
            .state
            .borrow()
            .last_selected
            .as_ref()
            .map(|record| record.package_id.clone());
        match package_id {
            Some(package_id) => self.refresh_record(&package_id).await,
            None => Ok(None),
        }
    }

    /// Reads the override for `package_id` through the active channel.
    ///
    /// # Errors
    ///
    /// See [`PrivilegedLocaleService::get_override`].
    pub async fn locale_override(&self, package_id: &str) -> Result<LocaleOverride> {
        let result = self.inner.locales.get_override(package_id).await;
        if let Err(e) = &result {
            self.note_failure(e);
        }
        result
    }

    /// Writes an override, then refreshes the record so its position follows.
    ///
    /// # Errors
    ///
    /// See [`PrivilegedLocaleService::set_override`].
    pub async fn set_locale_override(
        &self,
        package_id: &str,
        locales: &LocaleOverride,
    ) -> Result<Option<Notification>> {
        if let Err(e) = self.inner.locales.set_override(package_id, locales).await {
            self.note_failure(&e);
            return Err(e);
        }
        self.refresh_record(package_id).await
    }

    /// Clears the transient notification.
    pub fn reset_notification(&self) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.notification != Notification::None;
            state.notification = Notification::None;
            changed
        });
    }

    #[must_use]
    pub fn index_of_last_selected(&self) -> Option<usize> {
        self.inner.state.borrow().index_of_last_selected()
    }
}
