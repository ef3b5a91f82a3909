//! JSON package manifest.
//!
//! Stands in for the platform package manager on hosts that have none. The
//! file is a JSON array of [`PackageEntry`] objects:
//!
//! ```json
//! [
//!   { "package_id": "org.example.notes", "display_name": "Notes" },
//!   { "package_id": "org.example.clock", "display_name": "Clock", "is_system": true },
//!   { "package_id": "org.example.old", "display_name": "Old", "enabled": false }
//! ]
//! ```

use crate::directory::{PackageEntry, PackageInfo};
use crate::domain::{ApplangError, Result};
use async_trait::async_trait;
use std::path::Path;

/// [`PackageInfo`] over a manifest loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct ManifestPackageInfo {
    entries: Vec<PackageEntry>,
}

impl ManifestPackageInfo {
    #[must_use]
    pub const fn new(entries: Vec<PackageEntry>) -> Self {
        Self { entries }
    }

    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplangError::Io`] if the file cannot be read, or
    /// [`ApplangError::Package`] if it is not a valid manifest.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let entries: Vec<PackageEntry> = serde_json::from_str(&contents).map_err(|e| {
            ApplangError::Package(format!("invalid manifest {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), packages = entries.len(), "loaded package manifest");
        Ok(Self { entries })
    }
}

#[async_trait]
impl PackageInfo for ManifestPackageInfo {
    async fn list_installed_applications(&self) -> Result<Vec<PackageEntry>> {
        Ok(self.entries.clone())
    }

    async fn get_application_info(&self, package_id: &str) -> Result<Option<PackageEntry>> {
        Ok(self
            .entries
            .iter()
            .find(|entry| entry.package_id == package_id)
            .cloned())
    }
}
