//! Applang: per-application language settings manager.
//!
//! Applang lists the installed applications, shows which ones carry a locale
//! override, and reads or writes those overrides through whatever elevated
//! channel the host offers:
//! - A persistent superuser shell (`su`) when root is granted
//! - A secondary IPC broker service when it is reachable and permitted
//! - Read-only browsing when neither is available
//!
//! Around that it keeps a debounced, cancellable search over the directory and
//! a small selection history.

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  CLI (main.rs) / presentation layer                 │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │ Event
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - Session: the single state owner                  │
//! │  - Event dispatch                                   │
//! └─────────────────────────────────────────────────────┘
//!      │              │               │              │
//! ┌──────────┐  ┌────────────┐  ┌───────────┐  ┌────────────┐
//! │privilege/│  │ directory/ │  │ search/   │  │ history    │
//! │ probe    │  │ builder    │  │ filter    │  │ worker/    │
//! │ service  │  │            │  │ engine    │  │ storage/   │
//! └──────────┘  └────────────┘  └───────────┘  └────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - su shell, package manifest, paths                │
//! │  - records, labels, locale overrides, errors        │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - tracing to a rotating log file                   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: session state, operations, and event dispatch
//! - [`directory`]: package collaborator and directory builder
//! - [`domain`]: core types and errors
//! - [`history`]: async history tracker
//! - [`infrastructure`]: `su` shell, JSON package manifest, paths
//! - [`privilege`]: channel probe and privileged locale service
//! - [`search`]: filter and debounced search engine
//! - [`storage`]: JSON history store
//! - [`worker`]: history worker thread
//! - [`observability`]: logging setup
//!
//! # Configuration
//!
//! Either a TOML file:
//!
//! ```toml
//! debounce_ms = 300
//! build_concurrency = 8
//! host_package = "applang"
//! su_binary = "su"
//! data_dir = "~/.local/share/applang"
//! packages_file = "~/.config/applang/packages.json"
//! trace_level = "debug"
//! ```
//!
//! or a string map via [`Config::from_map`] with the same keys.
//!
//! # Initialization Flow
//!
//! 1. Parse [`Config`] and install tracing
//! 2. [`initialize`] wires the probe, locale service, builder, and history
//!    worker into a [`Session`]
//! 3. The first [`Session::refresh_directory`] probes for a channel, builds
//!    the directory, and publishes an initial search
//!
//! # Examples
//!
//! ```no_run
//! use applang::infrastructure::ManifestPackageInfo;
//! use applang::privilege::NoBroker;
//! use applang::{initialize, Config};
//! use std::sync::Arc;
//!
//! # async fn demo() -> applang::Result<()> {
//! let config = Config::default();
//! let packages = Arc::new(ManifestPackageInfo::default());
//! let session = initialize(&config, packages, Arc::new(NoBroker))?;
//!
//! session.refresh_directory().await?;
//! session.set_query("maps");
//! println!("{} apps", session.snapshot().directory.len());
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod directory;
pub mod domain;
pub mod history;
pub mod infrastructure;
pub mod observability;
pub mod privilege;
pub mod search;
pub mod storage;
pub mod worker;

#[cfg(test)]
mod testing;

pub use app::{handle_event, Event, Notification, Session, SessionParts, SessionState};
pub use domain::{ApplangError, ApplicationRecord, LocaleOverride, OperationMode, Result};

use directory::{DirectoryBuilder, PackageInfo};
use history::HistoryTracker;
use infrastructure::SuShell;
use privilege::{shared_shell, BrokerService, ChannelProbe, ModeCell, PrivilegedLocaleService};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_DEBOUNCE_MS: u64 = 300;
const DEFAULT_BUILD_CONCURRENCY: usize = 8;
const DEFAULT_HOST_PACKAGE: &str = "applang";
const DEFAULT_SU_BINARY: &str = "su";

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet period after typing before a search runs. Default: 300
    pub debounce_ms: u64,

    /// Maximum concurrent privileged reads during a directory build. Default: 8
    pub build_concurrency: usize,

    /// This application's own package id, hidden from the directory.
    pub host_package: String,

    /// Superuser shell binary. Default: `"su"`
    pub su_binary: String,

    /// Where history and logs live. Default: platform data dir + `applang`
    pub data_dir: PathBuf,

    /// JSON package manifest for hosts without a package manager.
    pub packages_file: Option<PathBuf>,

    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            build_concurrency: DEFAULT_BUILD_CONCURRENCY,
            host_package: DEFAULT_HOST_PACKAGE.to_string(),
            su_binary: DEFAULT_SU_BINARY.to_string(),
            data_dir: infrastructure::default_data_dir(),
            packages_file: None,
            trace_level: None,
        }
    }
}

impl Config {
    /// Parses configuration from a string map.
    ///
    /// # Parsing Rules
    ///
    /// - `debounce_ms`, `build_concurrency`: numbers, falling back to defaults
    ///   on parse errors; a concurrency of 0 also falls back
    /// - `host_package`, `su_binary`: non-empty strings
    /// - `data_dir`, `packages_file`: paths, `~` expanded
    /// - `trace_level`: passed through
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use applang::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("debounce_ms".to_string(), "150".to_string());
    /// map.insert("build_concurrency".to_string(), "lots".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.debounce_ms, 150);
    /// assert_eq!(config.build_concurrency, 8);
    /// ```
    #[must_use]
    pub fn from_map(config: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            config
                .get(key)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };

        Self {
            debounce_ms: text("debounce_ms")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.debounce_ms),
            build_concurrency: text("build_concurrency")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.build_concurrency),
            host_package: text("host_package").map_or(defaults.host_package, String::from),
            su_binary: text("su_binary").map_or(defaults.su_binary, String::from),
            data_dir: text("data_dir").map_or(defaults.data_dir, infrastructure::expand_tilde),
            packages_file: text("packages_file").map(infrastructure::expand_tilde),
            trace_level: text("trace_level").map(String::from),
        }
    }

    /// Loads configuration from a TOML file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ApplangError::Io`] if the file cannot be read, or
    /// [`ApplangError::Config`] if it is not valid TOML for this struct.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)
            .map_err(|e| ApplangError::Config(format!("{}: {e}", path.display())))?;

        config.data_dir = infrastructure::expand_tilde(&config.data_dir.to_string_lossy());
        config.packages_file = config
            .packages_file
            .map(|p| infrastructure::expand_tilde(&p.to_string_lossy()));
        if config.build_concurrency == 0 {
            config.build_concurrency = DEFAULT_BUILD_CONCURRENCY;
        }
        Ok(config)
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn history_file(&self) -> PathBuf {
        self.data_dir.join(infrastructure::HISTORY_FILE_NAME)
    }
}

/// Wires a [`Session`] from configuration and host collaborators.
///
/// Uses [`SuShell`] for the root channel and starts the history worker over
/// the JSON store in the data directory. No probe runs yet; the first
/// [`Session::refresh_directory`] does that.
///
/// # Errors
///
/// Returns an error if the history store cannot be opened or its worker
/// thread cannot be spawned.
pub fn initialize(
    config: &Config,
    packages: Arc<dyn PackageInfo>,
    broker: Arc<dyn BrokerService>,
) -> Result<Session> {
    tracing::debug!(data_dir = %config.data_dir.display(), "initializing applang");

    let mode = Arc::new(ModeCell::new());
    let shell = shared_shell(SuShell::new(config.su_binary.clone()));

    let probe = Arc::new(ChannelProbe::new(
        Arc::clone(&shell),
        Arc::clone(&broker),
        Arc::clone(&mode),
    ));
    probe.on_root_acquired(Arc::new(|| tracing::info!("root access acquired")));

    let locales = Arc::new(PrivilegedLocaleService::new(mode, shell, broker));
    let builder = Arc::new(DirectoryBuilder::new(
        packages,
        Arc::clone(&locales),
        config.host_package.clone(),
        config.build_concurrency,
    ));
    let history = HistoryTracker::open(config.history_file())?;

    Ok(Session::new(SessionParts {
        probe,
        locales,
        builder,
        history,
        debounce: config.debounce(),
    }))
}
