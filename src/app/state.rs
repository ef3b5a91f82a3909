//! Session state.
//!
//! [`SessionState`] is the single snapshot the presentation layer renders. It
//! is owned by one `watch` sender inside [`crate::app::Session`]; every change
//! is an atomic replacement observed through `watch::Receiver`, and nothing in
//! it is persisted.
//!
//! # State Components
//!
//! - **Directory**: every visible app, always in canonical order
//! - **Query / facets**: current search input
//! - **Search results**: the latest published filter output
//! - **History**: recently selected apps, most recent first
//! - **Mode**: mirror of the probe's last result
//! - **Notification**: transient hint after a single-record refresh

use crate::domain::{canonical_sort, ApplicationRecord, OperationMode};
use crate::search::FacetSelection;
use std::sync::Arc;

/// Transient hint raised when a refresh moves a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Notification {
    #[default]
    None,
    /// The record became modified and moved into the top group.
    MovedToTop,
    /// The record lost its override and moved out of the top group.
    MovedToBottom,
}

/// Everything the presentation layer needs to render.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Full directory in canonical order.
    pub directory: Arc<Vec<ApplicationRecord>>,

    /// Query as the user typed it, line breaks removed.
    pub query: String,

    /// Selected facets.
    pub facets: FacetSelection,

    /// Latest published search output.
    pub search_results: Arc<Vec<ApplicationRecord>>,

    /// Selection history joined against the directory, most recent first.
    pub history: Vec<ApplicationRecord>,

    /// A directory build is in flight.
    pub is_loading: bool,

    /// Result of the last probe.
    pub operation_mode: OperationMode,

    /// The app the user last opened.
    pub last_selected: Option<ApplicationRecord>,

    pub notification: Notification,

    /// Whether the search panel is expanded.
    pub is_expanded: bool,

    /// An elevated channel died since the last probe.
    pub privilege_lost: bool,
}

impl SessionState {
    /// Position of `package_id` in the directory.
    #[must_use]
    pub fn index_of(&self, package_id: &str) -> Option<usize> {
        self.directory
            .iter()
            .position(|record| record.package_id == package_id)
    }

    /// Position of the last selected app in the directory, for scroll restore.
    #[must_use]
    pub fn index_of_last_selected(&self) -> Option<usize> {
        self.last_selected
            .as_ref()
            .and_then(|record| self.index_of(&record.package_id))
    }

    /// Swaps in a freshly loaded record and restores canonical order.
    ///
    /// Returns `None` if the package is not in the directory or its labels did
    /// not change. Otherwise returns the notification to raise, which is
    /// [`Notification::None`] when the change did not affect `Modified`; a
    /// pending notification is left in place in that case.
    pub fn replace_record(&mut self, record: ApplicationRecord) -> Option<Notification> {
        let index = self.index_of(&record.package_id)?;
        let previous = &self.directory[index];
        if previous.labels == record.labels {
            return None;
        }

        let notification = match (previous.is_modified(), record.is_modified()) {
            (false, true) => Notification::MovedToTop,
            (true, false) => Notification::MovedToBottom,
            _ => Notification::None,
        };

        if self
            .last_selected
            .as_ref()
            .is_some_and(|last| last.package_id == record.package_id)
        {
            self.last_selected = Some(record.clone());
        }
        for entry in &mut self.history {
            if entry.package_id == record.package_id {
                *entry = record.clone();
            }
        }

        let directory = Arc::make_mut(&mut self.directory);
        directory[index] = record;
        canonical_sort(directory);

        if notification != Notification::None {
            self.notification = notification;
        }
        Some(notification)
    }
}
