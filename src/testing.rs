//! In-memory collaborators shared by unit tests.

use crate::directory::{PackageEntry, PackageInfo};
use crate::domain::{ApplangError, Result};
use crate::privilege::{
    shared_shell, BrokerConnection, BrokerService, ChannelProbe, ModeCell, PrivilegedLocaleService,
    ShellOutput, ShellSession,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A shell that opens but never grants root.
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

/// Broker connection backed by a map of package id to comma-joined tags.
#[derive(Default)]
pub struct MemoryConnection {
    pub dead: AtomicBool,
    pub reads: AtomicUsize,
    pub overrides: Mutex<HashMap<String, Vec<String>>>,
}

#[async_trait]
impl BrokerConnection for MemoryConnection {
    fn is_alive(&self) -> bool {
        !self.dead.load(Ordering::SeqCst)
    }

    async fn get_application_locales(&self, package_id: &str) -> Result<Vec<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .overrides
            .lock()
            .unwrap()
            .get(package_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_application_locales(&self, package_id: &str, language_tags: &str) -> Result<()> {
        let tags: Vec<String> = language_tags
            .split(',')
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        self.overrides
            .lock()
            .unwrap()
            .insert(package_id.to_string(), tags);
        Ok(())
    }
}

/// Broker that is always reachable and permitted.
pub struct MemoryBroker {
    pub connection: Arc<MemoryConnection>,
    pub connects: AtomicUsize,
}

#[async_trait]
impl BrokerService for MemoryBroker {
    async fn ping_reachable(&self) -> bool {
        true
    }
    async fn has_permission(&self) -> bool {
        true
    }
    async fn connect(&self) -> Result<Arc<dyn BrokerConnection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.connection) as Arc<dyn BrokerConnection>)
    }
}

/// Package collaborator over a fixed list.
#[derive(Default)]
pub struct StaticPackages {
    pub entries: Mutex<Vec<PackageEntry>>,
    pub fail: AtomicBool,
}

impl StaticPackages {
    pub fn new(entries: Vec<PackageEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl PackageInfo for StaticPackages {
    async fn list_installed_applications(&self) -> Result<Vec<PackageEntry>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApplangError::Package("package manager unavailable".to_string()));
        }
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn get_application_info(&self, package_id: &str) -> Result<Option<PackageEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.package_id == package_id)
            .cloned())
    }
}

/// The privilege stack wired to a [`MemoryBroker`].
pub struct Privilege {
    pub probe: Arc<ChannelProbe>,
    pub service: Arc<PrivilegedLocaleService>,
    pub connection: Arc<MemoryConnection>,
    pub broker: Arc<MemoryBroker>,
}

pub fn privilege() -> Privilege {
    let mode = Arc::new(ModeCell::new());
    let shell = shared_shell(NoRootShell);
    let connection = Arc::new(MemoryConnection::default());
    let broker = Arc::new(MemoryBroker {
        connection: Arc::clone(&connection),
        connects: AtomicUsize::new(0),
    });
    let probe = Arc::new(ChannelProbe::new(
        Arc::clone(&shell),
        broker.clone(),
        Arc::clone(&mode),
    ));
    let service = Arc::new(PrivilegedLocaleService::new(mode, shell, broker.clone()));
    Privilege {
        probe,
        service,
        connection,
        broker,
    }
}

/// Alpha (user app), Beta (system app), Zeta (user app).
pub fn sample_packages() -> Vec<PackageEntry> {
    vec![
        PackageEntry::new("com.example.zeta", "Zeta"),
        PackageEntry::new("com.example.alpha", "Alpha"),
        PackageEntry::new("com.example.beta", "Beta").system(true),
    ]
}
