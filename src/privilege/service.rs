//! Privileged locale service.
//!
//! [`PrivilegedLocaleService`] is the channel-agnostic facade that the rest of
//! the crate uses to read and write locale overrides. It looks at the shared
//! [`ModeCell`], lazily builds the matching [`LocaleChannel`] on first use, and
//! keeps reusing it until the probe runs again or the channel dies.
//!
//! Only one channel is active at a time. A `PrivilegeLost` failure drops the
//! cached channel so the next call does not reuse a dead connection; it does
//! not change the mode. That is the probe's job.

use super::broker::{BrokerLocaleChannel, BrokerService};
use super::channel::LocaleChannel;
use super::context::ModeCell;
use super::shell::{SharedShell, ShellLocaleChannel};
use crate::domain::{ApplangError, LocaleOverride, OperationMode, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::Instrument;

struct ActiveChannel {
    mode: OperationMode,
    epoch: u64,
    channel: Arc<dyn LocaleChannel>,
}

/// Facade over whichever elevated channel the probe selected.
pub struct PrivilegedLocaleService {
    mode: Arc<ModeCell>,
    shell: SharedShell,
    broker: Arc<dyn BrokerService>,
    active: Mutex<Option<ActiveChannel>>,
}

impl PrivilegedLocaleService {
    #[must_use]
    pub fn new(mode: Arc<ModeCell>, shell: SharedShell, broker: Arc<dyn BrokerService>) -> Self {
        Self {
            mode,
            shell,
            broker,
            active: Mutex::new(None),
        }
    }

    /// Returns the operation mode the service would use right now.
    #[must_use]
    pub fn mode(&self) -> OperationMode {
        self.mode.get()
    }

    /// Reads the locale override for `package_id`.
    ///
    /// # Errors
    ///
    /// - [`ApplangError::NotPrivileged`] while the mode is `None`
    /// - [`ApplangError::PrivilegeLost`] if the channel died; re-probe before retrying
    /// - [`ApplangError::Package`] for malformed ids or unexpected channel output
    pub async fn get_override(&self, package_id: &str) -> Result<LocaleOverride> {
        let channel = self.channel().await?;
        let result = channel.get_override(package_id).await;
        self.forget_if_lost(&result).await;
        result
    }

    /// Replaces the locale override for `package_id`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::get_override`].
    pub async fn set_override(&self, package_id: &str, locales: &LocaleOverride) -> Result<()> {
        async {
            let channel = self.channel().await?;
            let result = channel.set_override(package_id, locales).await;
            self.forget_if_lost(&result).await;
            result
        }
        .instrument(tracing::debug_span!("set_override", package_id = %package_id))
        .await
    }

    async fn channel(&self) -> Result<Arc<dyn LocaleChannel>> {
        let (mode, epoch) = self.mode.snapshot();
        if !mode.is_privileged() {
            return Err(ApplangError::NotPrivileged);
        }

        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            if current.mode == mode && current.epoch == epoch {
                return Ok(Arc::clone(&current.channel));
            }
            tracing::debug!(
                old_mode = %current.mode,
                new_mode = %mode,
                "privilege state changed, replacing channel"
            );
        }

        let channel: Arc<dyn LocaleChannel> = match mode {
            OperationMode::Root => Arc::new(ShellLocaleChannel::new(Arc::clone(&self.shell))),
            OperationMode::BrokerService => {
                let connection = self.broker.connect().await.map_err(|e| {
                    ApplangError::PrivilegeLost(format!("broker bind failed: {e}"))
                })?;
                Arc::new(BrokerLocaleChannel::new(connection))
            }
            OperationMode::None => return Err(ApplangError::NotPrivileged),
        };

        tracing::debug!(mode = %mode, epoch = epoch, "elevated channel established");
        *active = Some(ActiveChannel {
            mode,
            epoch,
            channel: Arc::clone(&channel),
        });
        Ok(channel)
    }

    async fn forget_if_lost<T>(&self, result: &Result<T>) {
        if let Err(e) = result {
            if e.is_privilege_lost() {
                tracing::warn!(error = %e, "elevated channel lost");
                *self.active.lock().await = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::privilege;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn rejects_calls_before_probe() {
        let p = privilege();
        let err = p.service.get_override("org.example").await.err();
        assert!(matches!(err, Some(ApplangError::NotPrivileged)));
    }

    #[tokio::test]
    async fn connection_is_established_once_and_reused() {
        let p = privilege();
        assert_eq!(p.probe.resolve_mode().await, OperationMode::BrokerService);

        p.service
            .set_override("org.example", &LocaleOverride::from_tags(["fr", "en"]))
            .await
            .unwrap();
        let locales = p.service.get_override("org.example").await.unwrap();

        assert_eq!(locales.language_tags(), "fr,en");
        assert_eq!(p.broker.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dead_connection_surfaces_privilege_lost() {
        let p = privilege();
        p.probe.resolve_mode().await;
        assert!(p.service.get_override("org.example").await.unwrap().is_empty());

        p.connection.dead.store(true, Ordering::SeqCst);
        let err = p.service.get_override("org.example").await.err();
        assert!(err.is_some_and(|e| e.is_privilege_lost()));

        p.connection.dead.store(false, Ordering::SeqCst);
        p.probe.resolve_mode().await;
        assert!(p.service.get_override("org.example").await.is_ok());
        assert_eq!(p.broker.connects.load(Ordering::SeqCst), 2);
    }
}
