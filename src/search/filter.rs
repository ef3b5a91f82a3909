//! Pure directory filtering.
//!
//! [`filter`] has no side effects and reads nothing but its arguments, so the
//! engine can run it on any thread and tests can call it directly.

use crate::domain::{AppLabel, ApplicationRecord, LabelSet};

/// Labels the user has switched on as search facets.
///
/// Facets combine conjunctively:
///
/// - `Modified` selected: only modified apps survive
/// - `SystemApp` not selected: system apps are dropped
///
/// # Examples
///
/// ```
/// use applang::domain::AppLabel;
/// use applang::search::FacetSelection;
///
/// let mut facets = FacetSelection::new();
/// assert!(facets.toggle(AppLabel::SystemApp));
/// assert!(facets.is_selected(AppLabel::SystemApp));
/// assert!(!facets.toggle(AppLabel::SystemApp));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FacetSelection(LabelSet);

impl FacetSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `label` and returns whether it is now selected.
    pub fn toggle(&mut self, label: AppLabel) -> bool {
        if self.0.remove(label) {
            false
        } else {
            self.0.insert(label);
            true
        }
    }

    #[must_use]
    pub fn is_selected(&self, label: AppLabel) -> bool {
        self.0.contains(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = AppLabel> + '_ {
        self.0.iter()
    }
}

impl FromIterator<AppLabel> for FacetSelection {
    fn from_iter<I: IntoIterator<Item = AppLabel>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Trims and lowercases a query for matching.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Returns whether `record` passes the facet selection.
#[must_use]
pub fn passes_facets(record: &ApplicationRecord, facets: &FacetSelection) -> bool {
    if facets.is_selected(AppLabel::Modified) && !record.is_modified() {
        return false;
    }
    if !facets.is_selected(AppLabel::SystemApp) && record.is_system_app() {
        return false;
    }
    true
}

/// Returns whether `record` matches an already normalized `needle`.
///
/// An empty needle matches everything.
#[must_use]
pub fn matches_query(record: &ApplicationRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.package_id.to_lowercase().contains(needle)
        || record.display_name.to_lowercase().contains(needle)
}

/// Filters `directory` by `query` and `facets`, preserving input order.
///
/// # Examples
///
/// ```
/// use applang::domain::{ApplicationRecord, IconHandle, LabelSet};
/// use applang::search::{filter, FacetSelection};
///
/// let directory = vec![
///     ApplicationRecord::new("org.a.alpha", "Alpha", IconHandle::default(), LabelSet::new()),
///     ApplicationRecord::new("org.a.zeta", "Zeta", IconHandle::default(), LabelSet::new()),
/// ];
/// let hits = filter(&directory, "  ALP ", &FacetSelection::new());
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].display_name, "Alpha");
/// ```
#[must_use]
pub fn filter(
    directory: &[ApplicationRecord],
    query: &str,
    facets: &FacetSelection,
) -> Vec<ApplicationRecord> {
    let needle = normalize_query(query);
    directory
        .iter()
        .filter(|record| passes_facets(record, facets) && matches_query(record, &needle))
        .cloned()
        .collect()
}
