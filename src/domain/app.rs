//! Application record domain model.
//!
//! This module defines [`ApplicationRecord`], the immutable snapshot of one
//! installed application as shown in the directory, together with its
//! [`AppLabel`] set and the canonical display ordering.
//!
//! Labels are computed once when a record is built or refreshed and stored on
//! the record. Nothing re-derives them from raw platform flags at read time.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A label attached to an application record.
///
/// Labels double as search facets: see [`crate::search::FacetSelection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AppLabel {
    /// The application ships with the system image.
    SystemApp,
    /// The application has a non-empty locale override.
    Modified,
}

/// The set of labels carried by an [`ApplicationRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelSet(BTreeSet<AppLabel>);

impl LabelSet {
    /// Creates an empty label set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a label set from the two facts the directory builder computes.
    ///
    /// # Examples
    ///
    /// ```
    /// use applang::domain::{AppLabel, LabelSet};
    ///
    /// let labels = LabelSet::from_flags(true, false);
    /// assert!(labels.contains(AppLabel::SystemApp));
    /// assert!(!labels.contains(AppLabel::Modified));
    /// ```
    #[must_use]
    pub fn from_flags(is_system: bool, is_modified: bool) -> Self {
        let mut labels = Self::new();
        if is_system {
            labels.insert(AppLabel::SystemApp);
        }
        if is_modified {
            labels.insert(AppLabel::Modified);
        }
        labels
    }

    pub fn insert(&mut self, label: AppLabel) -> bool {
        self.0.insert(label)
    }

    pub fn remove(&mut self, label: AppLabel) -> bool {
        self.0.remove(&label)
    }

    #[must_use]
    pub fn contains(&self, label: AppLabel) -> bool {
        self.0.contains(&label)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AppLabel> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<AppLabel> for LabelSet {
    fn from_iter<I: IntoIterator<Item = AppLabel>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Opaque handle to an application icon.
///
/// The core never decodes icons; the handle is whatever the package-info
/// collaborator hands out (a resource id, a cache key, a path).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconHandle(pub String);

/// One installed application as shown in the directory.
///
/// # Fields
///
/// - `package_id`: unique package identifier
/// - `display_name`: user-visible label resolved by the package collaborator
/// - `icon`: opaque icon handle
/// - `labels`: facts computed at build time (system app, modified locale)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub package_id: String,
    pub display_name: String,
    pub icon: IconHandle,
    pub labels: LabelSet,
}

impl ApplicationRecord {
    /// Creates a record with the given identity and labels.
    pub fn new(
        package_id: impl Into<String>,
        display_name: impl Into<String>,
        icon: IconHandle,
        labels: LabelSet,
    ) -> Self {
        Self {
            package_id: package_id.into(),
            display_name: display_name.into(),
            icon,
            labels,
        }
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.labels.contains(AppLabel::Modified)
    }

    #[must_use]
    pub fn is_system_app(&self) -> bool {
        self.labels.contains(AppLabel::SystemApp)
    }
}

/// Compares two records by the canonical display order.
///
/// Modified applications come first; within each group, display names are
/// compared case-insensitively. The package id breaks remaining ties so the
/// order is total and repeated sorts are stable.
#[must_use]
pub fn canonical_cmp(a: &ApplicationRecord, b: &ApplicationRecord) -> Ordering {
    b.is_modified()
        .cmp(&a.is_modified())
        .then_with(|| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
        })
        .then_with(|| a.package_id.cmp(&b.package_id))
}

/// Sorts records in place into the canonical display order.
///
/// # Examples
///
/// ```
/// use applang::domain::{canonical_sort, ApplicationRecord, IconHandle, LabelSet};
///
/// let mut apps = vec![
///     ApplicationRecord::new("z.app", "Zeta", IconHandle::default(), LabelSet::from_flags(false, false)),
///     ApplicationRecord::new("a.app", "Alpha", IconHandle::default(), LabelSet::from_flags(false, true)),
///     ApplicationRecord::new("b.app", "beta", IconHandle::default(), LabelSet::from_flags(true, false)),
/// ];
/// canonical_sort(&mut apps);
/// let names: Vec<_> = apps.iter().map(|a| a.display_name.as_str()).collect();
/// assert_eq!(names, ["Alpha", "beta", "Zeta"]);
/// ```
pub fn canonical_sort(records: &mut [ApplicationRecord]) {
    records.sort_by(canonical_cmp);
}
