//! Event dispatch.
//!
//! The presentation layer reports what the user did as an [`Event`];
//! [`handle_event`] maps each one onto a [`Session`] operation. Events are
//! processed in the order they arrive; the resulting state is observed through
//! [`Session::subscribe`], not returned.
//!
//! # Event Types
//!
//! - **Lifecycle**: `Load`, `RetryPrivilege`, `ReturnedFromApp`
//! - **Search**: `QueryChanged`, `ConfirmQuery`, `ToggleFacet`, `SetExpanded`
//! - **Selection**: `SelectApp`, `ClearHistory`
//! - **Editing**: `SetLocaleOverride`, `RefreshRecord`, `DismissNotification`

use super::session::Session;
use crate::domain::{AppLabel, LocaleOverride, Result};

/// Something the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// First load, or a pull-to-refresh.
    Load,
    /// The user asked to try gaining privileges again.
    RetryPrivilege,
    /// The user came back from an app they opened.
    ReturnedFromApp,
    /// Raw text from the search field.
    QueryChanged(String),
    /// Search key pressed.
    ConfirmQuery,
    ToggleFacet(AppLabel),
    SetExpanded(bool),
    SelectApp(String),
    ClearHistory,
    SetLocaleOverride {
        package_id: String,
        locales: LocaleOverride,
    },
    RefreshRecord(String),
    DismissNotification,
}

/// Applies one event to the session.
///
/// # Errors
///
/// Propagates the failing session operation's error. The session state is
/// left consistent either way.
pub async fn handle_event(session: &Session, event: Event) -> Result<()> {
    tracing::debug!(event = ?event, "handling event");

    match event {
        Event::Load => session.refresh_directory().await,
        Event::RetryPrivilege => session.retry_privilege().await.map(|_| ()),
        Event::ReturnedFromApp => session.reload_last_selected().await.map(|_| ()),
        Event::QueryChanged(raw) => {
            session.set_query(&raw);
            Ok(())
        }
        Event::ConfirmQuery => {
            session.confirm_query();
            Ok(())
        }
        Event::ToggleFacet(label) => {
            session.toggle_facet(label);
            Ok(())
        }
        Event::SetExpanded(expanded) => session.set_expanded(expanded).await,
        Event::SelectApp(package_id) => session.select_app(&package_id).await,
        Event::ClearHistory => session.clear_history().await,
        Event::SetLocaleOverride {
            package_id,
            locales,
        } => session
            .set_locale_override(&package_id, &locales)
            .await
            .map(|_| ()),
        Event::RefreshRecord(package_id) => session.refresh_record(&package_id).await.map(|_| ()),
        Event::DismissNotification => {
            session.reset_notification();
            Ok(())
        }
    }
}
