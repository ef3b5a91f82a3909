//! Broker service channel.
//!
//! The broker is a secondary, system-level IPC service that performs locale
//! operations on the caller's behalf once the caller holds its permission. The
//! service itself is an external collaborator ([`BrokerService`]); this module
//! adapts a live [`BrokerConnection`] into a [`LocaleChannel`].

use super::channel::{validate_language_tags, validate_package_id, LocaleChannel};
use crate::domain::{ApplangError, LocaleOverride, OperationMode, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Discovery and binding surface of the broker service.
#[async_trait]
pub trait BrokerService: Send + Sync {
    /// Returns `true` if the broker process answers.
    async fn ping_reachable(&self) -> bool;

    /// Returns `true` if the broker has granted this caller its permission.
    async fn has_permission(&self) -> bool;

    /// Binds the remote locale service.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker refuses or dies while binding.
    async fn connect(&self) -> Result<Arc<dyn BrokerConnection>>;
}

/// A bound remote locale service.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    /// Returns `true` while the remote binder is alive.
    fn is_alive(&self) -> bool;

    /// Returns the language tags currently forced on `package_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplangError::PrivilegeLost`] if the remote died mid-call.
    async fn get_application_locales(&self, package_id: &str) -> Result<Vec<String>>;

    /// Forces `language_tags` (comma-separated, possibly empty) on `package_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplangError::PrivilegeLost`] if the remote died mid-call.
    async fn set_application_locales(&self, package_id: &str, language_tags: &str) -> Result<()>;
}

/// Broker stand-in for hosts where no broker service exists.
///
/// Never reachable, so the probe always falls through it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBroker;

#[async_trait]
impl BrokerService for NoBroker {
    async fn ping_reachable(&self) -> bool {
        false
    }

    async fn has_permission(&self) -> bool {
        false
    }

    async fn connect(&self) -> Result<Arc<dyn BrokerConnection>> {
        Err(ApplangError::ChannelUnavailable("no broker service on this host".to_string()))
    }
}

/// [`LocaleChannel`] backed by a bound broker connection.
pub struct BrokerLocaleChannel {
    connection: Arc<dyn BrokerConnection>,
    in_flight: Mutex<()>,
}

impl BrokerLocaleChannel {
    #[must_use]
    pub fn new(connection: Arc<dyn BrokerConnection>) -> Self {
        Self {
            connection,
            in_flight: Mutex::new(()),
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.connection.is_alive() {
            Ok(())
        } else {
            Err(ApplangError::PrivilegeLost("broker connection died".to_string()))
        }
    }
}

#[async_trait]
impl LocaleChannel for BrokerLocaleChannel {
    fn kind(&self) -> OperationMode {
        OperationMode::BrokerService
    }

    async fn get_override(&self, package_id: &str) -> Result<LocaleOverride> {
        validate_package_id(package_id)?;
        let _turn = self.in_flight.lock().await;
        self.ensure_alive()?;
        let tags = self.connection.get_application_locales(package_id).await?;
        Ok(LocaleOverride::from_tags(tags))
    }

    async fn set_override(&self, package_id: &str, locales: &LocaleOverride) -> Result<()> {
        validate_package_id(package_id)?;
        validate_language_tags(locales)?;
        let _turn = self.in_flight.lock().await;
        self.ensure_alive()?;
        self.connection
            .set_application_locales(package_id, &locales.language_tags())
            .await?;
        tracing::debug!(package_id = %package_id, locales = %locales, "wrote override via broker");
        Ok(())
    }
}
