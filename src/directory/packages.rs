//! Package-info collaborator.
//!
//! The operating system's package enumeration and label/icon resolution are
//! outside this crate. [`PackageInfo`] is the seam; the CLI ships a JSON
//! manifest implementation in [`crate::infrastructure::manifest`].

use crate::domain::{IconHandle, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One installed application as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub package_id: String,
    pub display_name: String,
    #[serde(default)]
    pub icon: IconHandle,
    /// Platform "system application" flag.
    #[serde(default)]
    pub is_system: bool,
    /// Disabled applications are hidden from the directory.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl PackageEntry {
    pub fn new(package_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            display_name: display_name.into(),
            icon: IconHandle::default(),
            is_system: false,
            enabled: true,
        }
    }

    #[must_use]
    pub const fn system(mut self, is_system: bool) -> Self {
        self.is_system = is_system;
        self
    }

    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Enumerates installed applications.
#[async_trait]
pub trait PackageInfo: Send + Sync {
    /// Lists every installed application, enabled or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be queried at all.
    async fn list_installed_applications(&self) -> Result<Vec<PackageEntry>>;

    /// Looks up one application. `Ok(None)` means it is not installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be queried.
    async fn get_application_info(&self, package_id: &str) -> Result<Option<PackageEntry>>;
}
