//! Shared fakes for integration tests.

#![allow(dead_code)]

use applang::directory::{DirectoryBuilder, PackageEntry, PackageInfo};
use applang::history::HistoryTracker;
use applang::privilege::{
    shared_shell, BrokerConnection, BrokerService, ChannelProbe, ModeCell, PrivilegedLocaleService,
    ShellOutput, ShellSession,
};
use applang::{ApplangError, Result, Session, SessionParts};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOST: &str = "com.example.applang";

pub struct NoRootShell;

impl ShellSession for NoRootShell {
    fn is_alive(&mut self) -> bool {
        true
    }
    fn close(&mut self) {}
    fn open(&mut self) -> Result<()> {
        Ok(())
    }
    fn is_root_granted(&mut self) -> bool {
        false
    }
    fn exec(&mut self, _command: &str) -> Result<ShellOutput> {
        Err(ApplangError::PrivilegeLost("not root".to_string()))
    }
}

#[derive(Default)]
pub struct Broker {
    pub reachable: AtomicBool,
    pub dead: AtomicBool,
    pub ping_delay_ms: AtomicU64,
    pub overrides: Mutex<HashMap<String, Vec<String>>>,
}

pub struct Connection(Arc<Broker>);

#[async_trait]
impl BrokerConnection for Connection {
    fn is_alive(&self) -> bool {
        !self.0.dead.load(Ordering::SeqCst)
    }

    async fn get_application_locales(&self, package_id: &str) -> Result<Vec<String>> {
        Ok(self
            .0
            .overrides
            .lock()
            .unwrap()
            .get(package_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_application_locales(&self, package_id: &str, language_tags: &str) -> Result<()> {
        let tags = language_tags
            .split(',')
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        self.0
            .overrides
            .lock()
            .unwrap()
            .insert(package_id.to_string(), tags);
        Ok(())
    }
}

pub struct SharedBroker(pub Arc<Broker>);

#[async_trait]
impl BrokerService for SharedBroker {
    async fn ping_reachable(&self) -> bool {
        let delay = self.0.ping_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.0.reachable.load(Ordering::SeqCst)
    }
    async fn has_permission(&self) -> bool {
        true
    }
    async fn connect(&self) -> Result<Arc<dyn BrokerConnection>> {
        Ok(Arc::new(Connection(Arc::clone(&self.0))))
    }
}

pub struct Packages(pub Vec<PackageEntry>);

#[async_trait]
impl PackageInfo for Packages {
    async fn list_installed_applications(&self) -> Result<Vec<PackageEntry>> {
        Ok(self.0.clone())
    }

    async fn get_application_info(&self, package_id: &str) -> Result<Option<PackageEntry>> {
        Ok(self.0.iter().find(|e| e.package_id == package_id).cloned())
    }
}

/// Returns `first` after `delay` on the first listing, `rest` immediately after.
pub struct SlowFirstListing {
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub first: Vec<PackageEntry>,
    pub rest: Vec<PackageEntry>,
}

#[async_trait]
impl PackageInfo for SlowFirstListing {
    async fn list_installed_applications(&self) -> Result<Vec<PackageEntry>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(self.delay).await;
            Ok(self.first.clone())
        } else {
            Ok(self.rest.clone())
        }
    }

    async fn get_application_info(&self, package_id: &str) -> Result<Option<PackageEntry>> {
        Ok(self
            .first
            .iter()
            .chain(&self.rest)
            .find(|e| e.package_id == package_id)
            .cloned())
    }
}

/// Alpha (user app), Beta (system app), Zeta (user app), plus the host itself.
pub fn sample_packages() -> Vec<PackageEntry> {
    vec![
        PackageEntry::new("com.example.zeta", "Zeta"),
        PackageEntry::new("com.example.alpha", "Alpha"),
        PackageEntry::new("com.example.beta", "Beta").system(true),
        PackageEntry::new(HOST, "Applang"),
    ]
}

pub struct Harness {
    pub session: Session,
    pub broker: Arc<Broker>,
    pub _dir: tempfile::TempDir,
}

pub fn harness() -> Harness {
    harness_with(Arc::new(Packages(sample_packages())))
}

pub fn harness_with(packages: Arc<dyn PackageInfo>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let broker = Arc::new(Broker::default());
    broker.reachable.store(true, Ordering::SeqCst);

    let mode = Arc::new(ModeCell::new());
    let shell = shared_shell(NoRootShell);
    let service: Arc<dyn BrokerService> = Arc::new(SharedBroker(Arc::clone(&broker)));
    let probe = Arc::new(ChannelProbe::new(
        Arc::clone(&shell),
        Arc::clone(&service),
        Arc::clone(&mode),
    ));
    let locales = Arc::new(PrivilegedLocaleService::new(mode, shell, service));
    let builder = Arc::new(DirectoryBuilder::new(
        packages,
        Arc::clone(&locales),
        HOST,
        4,
    ));
    let history = HistoryTracker::open(dir.path().join("history.json")).unwrap();

    let session = Session::new(SessionParts {
        probe,
        locales,
        builder,
        history,
        debounce: Duration::from_millis(300),
    });
    Harness {
        session,
        broker,
        _dir: dir,
    }
}

pub fn names<'a>(records: impl IntoIterator<Item = &'a applang::ApplicationRecord>) -> Vec<String> {
    records.into_iter().map(|r| r.display_name.clone()).collect()
}
