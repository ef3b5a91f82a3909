//! App directory builder.
//!
//! Turns the package collaborator's raw list into canonically sorted
//! [`ApplicationRecord`]s. Each record needs one privileged read to decide the
//! `Modified` label; those reads run concurrently, bounded by
//! `build_concurrency`, and complete in whatever order the channel serves them.
//! The result is sorted afterwards, so completion order does not matter.
//!
//! Per-application failures never abort a build. A record whose read failed
//! is kept without the `Modified` label. If any read reported a lost channel,
//! [`DirectoryBuild::privilege_lost`] is set so the session can prompt a
//! re-probe.

use super::packages::{PackageEntry, PackageInfo};
use crate::domain::{canonical_sort, ApplangError, ApplicationRecord, LabelSet, Result};
use crate::privilege::PrivilegedLocaleService;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::Instrument;

/// Output of one directory build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryBuild {
    /// Records in canonical order.
    pub records: Vec<ApplicationRecord>,
    /// At least one privileged read failed because the channel died.
    pub privilege_lost: bool,
}

/// Builds the application directory.
pub struct DirectoryBuilder {
    packages: Arc<dyn PackageInfo>,
    locales: Arc<PrivilegedLocaleService>,
    host_package: String,
    concurrency: usize,
}

impl DirectoryBuilder {
    /// Creates a builder.
    ///
    /// # Parameters
    ///
    /// * `packages` - package enumeration collaborator
    /// * `locales` - privileged locale facade used for the `Modified` label
    /// * `host_package` - this application's own id, excluded from the directory
    /// * `concurrency` - maximum privileged reads in flight (at least 1)
    #[must_use]
    pub fn new(
        packages: Arc<dyn PackageInfo>,
        locales: Arc<PrivilegedLocaleService>,
        host_package: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            packages,
            locales,
            host_package: host_package.into(),
            concurrency: concurrency.max(1),
        }
    }

    /// Enumerates, labels, and sorts every visible application.
    ///
    /// # Errors
    ///
    /// Fails only if the package collaborator cannot list applications.
    pub async fn build_directory(&self) -> Result<DirectoryBuild> {
        async {
            let entries = self.packages.list_installed_applications().await?;
            let total = entries.len();

            let visible: Vec<PackageEntry> = entries
                .into_iter()
                .filter(|entry| self.is_listed(entry))
                .collect();

            tracing::debug!(total = total, visible = visible.len(), "enumerated applications");

            let annotated: Vec<(ApplicationRecord, Option<ApplangError>)> = stream::iter(visible)
                .map(|entry| self.annotate(entry))
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            let mut build = DirectoryBuild::default();
            let mut failures = 0usize;
            for (record, error) in annotated {
                if let Some(e) = error {
                    failures += 1;
                    build.privilege_lost |= e.is_privilege_lost();
                }
                build.records.push(record);
            }
            canonical_sort(&mut build.records);

            tracing::debug!(
                records = build.records.len(),
                failures = failures,
                privilege_lost = build.privilege_lost,
                "directory built"
            );
            Ok(build)
        }
        .instrument(tracing::debug_span!("build_directory", concurrency = self.concurrency))
        .await
    }

    /// Rebuilds the record for one package.
    ///
    /// Returns `Ok(None)` if the package is gone, disabled, or the host itself.
    ///
    /// # Errors
    ///
    /// Unlike a full build, a failed privileged read is returned to the caller.
    pub async fn load_record(&self, package_id: &str) -> Result<Option<ApplicationRecord>> {
        let Some(entry) = self.packages.get_application_info(package_id).await? else {
            tracing::debug!(package_id = %package_id, "package no longer installed");
            return Ok(None);
        };
        if !self.is_listed(&entry) {
            return Ok(None);
        }
        let is_modified = self.read_modified(&entry.package_id).await?;
        Ok(Some(Self::to_record(entry, is_modified)))
    }

    fn is_listed(&self, entry: &PackageEntry) -> bool {
        if entry.package_id.trim().is_empty() {
            tracing::warn!(display_name = %entry.display_name, "skipping package without id");
            return false;
        }
        entry.enabled && entry.package_id != self.host_package
    }

    async fn read_modified(&self, package_id: &str) -> Result<bool> {
        if !self.locales.mode().is_privileged() {
            return Ok(false);
        }
        Ok(!self.locales.get_override(package_id).await?.is_empty())
    }

    async fn annotate(&self, entry: PackageEntry) -> (ApplicationRecord, Option<ApplangError>) {
        match self.read_modified(&entry.package_id).await {
            Ok(is_modified) => (Self::to_record(entry, is_modified), None),
            Err(e) => {
                tracing::debug!(package_id = %entry.package_id, error = %e, "override read failed");
                (Self::to_record(entry, false), Some(e))
            }
        }
    }

    fn to_record(entry: PackageEntry, is_modified: bool) -> ApplicationRecord {
        ApplicationRecord {
            labels: LabelSet::from_flags(entry.is_system, is_modified),
            package_id: entry.package_id,
            display_name: entry.display_name,
            icon: entry.icon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AppLabel;
    use crate::testing::{privilege, sample_packages, StaticPackages};
    use std::sync::atomic::Ordering;

    const HOST: &str = "com.example.applang";

    fn builder(entries: Vec<PackageEntry>) -> (DirectoryBuilder, crate::testing::Privilege) {
        let privilege = privilege();
        let builder = DirectoryBuilder::new(
            Arc::new(StaticPackages::new(entries)),
            Arc::clone(&privilege.service),
            HOST,
            4,
        );
        (builder, privilege)
    }

    fn names(records: &[ApplicationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.display_name.as_str()).collect()
    }

    #[tokio::test]
    async fn unprivileged_build_skips_override_reads() {
        let (builder, privilege) = builder(sample_packages());

        let build = builder.build_directory().await.unwrap();

        assert_eq!(names(&build.records), ["Alpha", "Beta", "Zeta"]);
        assert!(build.records.iter().all(|r| !r.is_modified()));
        assert!(build.records[1].labels.contains(AppLabel::SystemApp));
        assert!(!build.privilege_lost);
        assert_eq!(privilege.connection.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn modified_apps_sort_first() {
        let (builder, privilege) = builder(sample_packages());
        privilege
            .connection
            .overrides
            .lock()
            .unwrap()
            .insert("com.example.zeta".to_string(), vec!["fr".to_string()]);
        privilege.probe.resolve_mode().await;

        let build = builder.build_directory().await.unwrap();

        assert_eq!(names(&build.records), ["Zeta", "Alpha", "Beta"]);
        assert!(build.records[0].labels.contains(AppLabel::Modified));
        assert_eq!(privilege.connection.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn host_disabled_and_nameless_entries_are_hidden() {
        let mut entries = sample_packages();
        entries.push(PackageEntry::new(HOST, "Applang"));
        entries.push(PackageEntry::new("com.example.off", "Off").enabled(false));
        entries.push(PackageEntry::new("  ", "Broken"));
        let (builder, _privilege) = builder(entries);

        let build = builder.build_directory().await.unwrap();

        assert_eq!(names(&build.records), ["Alpha", "Beta", "Zeta"]);
    }

    #[tokio::test]
    async fn lost_channel_keeps_records_and_flags_build() {
        let (builder, privilege) = builder(sample_packages());
        privilege.probe.resolve_mode().await;
        privilege.connection.dead.store(true, Ordering::SeqCst);

        let build = builder.build_directory().await.unwrap();

        assert_eq!(build.records.len(), 3);
        assert!(build.records.iter().all(|r| !r.is_modified()));
        assert!(build.privilege_lost);
    }

    #[tokio::test]
    async fn listing_failure_fails_the_build() {
        let packages = Arc::new(StaticPackages::new(sample_packages()));
        packages.fail.store(true, Ordering::SeqCst);
        let privilege = privilege();
        let builder = DirectoryBuilder::new(packages, privilege.service, HOST, 4);

        assert!(matches!(
            builder.build_directory().await,
            Err(ApplangError::Package(_))
        ));
    }

    #[tokio::test]
    async fn load_record_reflects_new_override() {
        let (builder, privilege) = builder(sample_packages());
        privilege.probe.resolve_mode().await;
        privilege
            .service
            .set_override("com.example.beta", &crate::domain::LocaleOverride::from_tags(["de"]))
            .await
            .unwrap();

        let record = builder.load_record("com.example.beta").await.unwrap().unwrap();
        assert!(record.is_modified());
        assert!(record.is_system_app());

        assert!(builder.load_record("com.example.missing").await.unwrap().is_none());
        assert!(builder.load_record(HOST).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_record_propagates_lost_channel() {
        let (builder, privilege) = builder(sample_packages());
        privilege.probe.resolve_mode().await;
        privilege.connection.dead.store(true, Ordering::SeqCst);

        let err = builder.load_record("com.example.alpha").await.err();
        assert!(err.is_some_and(|e| e.is_privilege_lost()));
    }
}
