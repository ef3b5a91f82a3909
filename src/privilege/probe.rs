//! Elevated channel probe.
//!
//! [`ChannelProbe::resolve_mode`] decides which privilege channel is usable
//! right now and records the answer in the shared [`ModeCell`]. It is the only
//! writer of the operation mode.
//!
//! # Probe order
//!
//! 1. Close the shell session if it is alive, then open a fresh one. A session
//!    opened under an earlier privilege state is never reused.
//! 2. If the fresh shell reports root, the mode is `Root` and every registered
//!    root listener fires.
//! 3. Otherwise the broker is usable only if it is reachable *and* has granted
//!    permission. Then the mode is `BrokerService`.
//! 4. Otherwise the mode is `None`.
//!
//! Channel failures are absorbed: a shell that cannot spawn is simply "not
//! root" and an unreachable broker is "not usable".

use super::broker::BrokerService;
use super::context::ModeCell;
use super::shell::{with_session, SharedShell};
use crate::domain::{OperationMode, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Instrument;

/// Callback fired when a probe acquires root.
pub type RootListener = Arc<dyn Fn() + Send + Sync>;

/// Detects the usable privilege channel.
pub struct ChannelProbe {
    shell: SharedShell,
    broker: Arc<dyn BrokerService>,
    mode: Arc<ModeCell>,
    listeners: Mutex<Vec<RootListener>>,
}

impl ChannelProbe {
    #[must_use]
    pub fn new(shell: SharedShell, broker: Arc<dyn BrokerService>, mode: Arc<ModeCell>) -> Self {
        Self {
            shell,
            broker,
            mode,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Registers a callback for the "root acquired" notification.
    pub fn on_root_acquired(&self, listener: RootListener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Returns the mode recorded by the last probe.
    #[must_use]
    pub fn current(&self) -> OperationMode {
        self.mode.get()
    }

    /// Re-evaluates the privilege channels from scratch.
    ///
    /// Never fails: every channel error folds into "that channel is unavailable".
    pub async fn resolve_mode(&self) -> OperationMode {
        async {
            let root = match self.reopen_shell().await {
                Ok(granted) => granted,
                Err(e) => {
                    tracing::debug!(error = %e, "root shell unavailable");
                    false
                }
            };

            let mode = if root {
                OperationMode::Root
            } else if self.broker_usable().await {
                OperationMode::BrokerService
            } else {
                OperationMode::None
            };

            self.mode.set(mode);
            tracing::info!(mode = %mode, "privilege channel resolved");

            if root {
                self.notify_root_acquired();
            }
            mode
        }
        .instrument(tracing::debug_span!("resolve_mode"))
        .await
    }

    async fn reopen_shell(&self) -> Result<bool> {
        with_session(&self.shell, |session| {
            if session.is_alive() {
                tracing::debug!("closing stale shell session");
                session.close();
            }
            session.open()?;
            Ok(session.is_root_granted())
        })
        .await
    }

    async fn broker_usable(&self) -> bool {
        if !self.broker.ping_reachable().await {
            tracing::debug!("broker not reachable");
            return false;
        }
        let granted = self.broker.has_permission().await;
        tracing::debug!(granted = granted, "broker permission checked");
        granted
    }

    fn notify_root_acquired(&self) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ApplangError;
    use crate::privilege::broker::BrokerConnection;
    use crate::privilege::shell::{shared_shell, ShellOutput, ShellSession};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    fn log(calls: &CallLog, call: &'static str) {
        calls.lock().unwrap().push(call);
    }

    struct FakeShell {
        calls: CallLog,
        alive: bool,
        root: bool,
        spawnable: bool,
    }

    impl ShellSession for FakeShell {
        fn is_alive(&mut self) -> bool {
            log(&self.calls, "shell.is_alive");
            self.alive
        }
        fn close(&mut self) {
            log(&self.calls, "shell.close");
            self.alive = false;
        }
        fn open(&mut self) -> Result<()> {
            log(&self.calls, "shell.open");
            if self.spawnable {
                self.alive = true;
                Ok(())
            } else {
                Err(ApplangError::ChannelUnavailable("su not found".to_string()))
            }
        }
        fn is_root_granted(&mut self) -> bool {
            log(&self.calls, "shell.is_root_granted");
            self.root
        }
        fn exec(&mut self, _command: &str) -> Result<ShellOutput> {
            Ok(ShellOutput::default())
        }
    }

    struct FakeBroker {
        calls: CallLog,
        reachable: bool,
        permission: bool,
    }

    #[async_trait]
    impl BrokerService for FakeBroker {
        async fn ping_reachable(&self) -> bool {
            log(&self.calls, "broker.ping");
            self.reachable
        }
        async fn has_permission(&self) -> bool {
            log(&self.calls, "broker.permission");
            self.permission
        }
        async fn connect(&self) -> Result<Arc<dyn BrokerConnection>> {
            Err(ApplangError::ChannelUnavailable("not in this test".to_string()))
        }
    }

    fn build_probe(shell: FakeShell, broker: FakeBroker) -> (ChannelProbe, Arc<ModeCell>) {
        let mode = Arc::new(ModeCell::new());
        let probe = ChannelProbe::new(shared_shell(shell), Arc::new(broker), Arc::clone(&mode));
        (probe, mode)
    }

    #[tokio::test]
    async fn stale_shell_is_closed_before_broker_check() {
        let calls = CallLog::default();
        let shell = FakeShell { calls: Arc::clone(&calls), alive: true, root: false, spawnable: true };
        let broker = FakeBroker { calls: Arc::clone(&calls), reachable: true, permission: true };
        let (probe, mode) = build_probe(shell, broker);

        assert_eq!(probe.resolve_mode().await, OperationMode::BrokerService);
        assert_eq!(mode.get(), OperationMode::BrokerService);
        assert_eq!(
            *calls.lock().unwrap(),
            [
                "shell.is_alive",
                "shell.close",
                "shell.open",
                "shell.is_root_granted",
                "broker.ping",
                "broker.permission",
            ]
        );
    }

    #[tokio::test]
    async fn root_wins_and_notifies_listeners() {
        let calls = CallLog::default();
        let shell = FakeShell { calls: Arc::clone(&calls), alive: false, root: true, spawnable: true };
        let broker = FakeBroker { calls: Arc::clone(&calls), reachable: true, permission: true };
        let (probe, _mode) = build_probe(shell, broker);

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        probe.on_root_acquired(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(probe.resolve_mode().await, OperationMode::Root);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!calls.lock().unwrap().contains(&"broker.ping"));
    }

    #[tokio::test]
    async fn broker_needs_both_reachability_and_permission() {
        let calls = CallLog::default();
        let shell = FakeShell { calls: Arc::clone(&calls), alive: false, root: false, spawnable: true };
        let broker = FakeBroker { calls: Arc::clone(&calls), reachable: true, permission: false };
        let (probe, _) = build_probe(shell, broker);
        assert_eq!(probe.resolve_mode().await, OperationMode::None);

        let shell = FakeShell { calls: Arc::clone(&calls), alive: false, root: false, spawnable: true };
        let broker = FakeBroker { calls: Arc::clone(&calls), reachable: false, permission: true };
        let (probe, _) = build_probe(shell, broker);
        assert_eq!(probe.resolve_mode().await, OperationMode::None);
    }

    #[tokio::test]
    async fn spawn_failure_falls_through_to_broker() {
        let calls = CallLog::default();
        let shell = FakeShell { calls: Arc::clone(&calls), alive: false, root: true, spawnable: false };
        let broker = FakeBroker { calls: Arc::clone(&calls), reachable: true, permission: true };
        let (probe, _) = build_probe(shell, broker);

        assert_eq!(probe.resolve_mode().await, OperationMode::BrokerService);
        assert!(!calls.lock().unwrap().contains(&"shell.is_root_granted"));
    }

    #[tokio::test]
    async fn reprobe_reevaluates_from_scratch() {
        let calls = CallLog::default();
        let shell = FakeShell { calls: Arc::clone(&calls), alive: false, root: true, spawnable: true };
        let broker = FakeBroker { calls: Arc::clone(&calls), reachable: false, permission: false };
        let (probe, mode) = build_probe(shell, broker);

        probe.resolve_mode().await;
        probe.resolve_mode().await;

        let opens = calls.lock().unwrap().iter().filter(|c| **c == "shell.open").count();
        let closes = calls.lock().unwrap().iter().filter(|c| **c == "shell.close").count();
        assert_eq!(opens, 2);
        assert_eq!(closes, 1);
        assert_eq!(mode.snapshot(), (OperationMode::Root, 2));
    }
}
