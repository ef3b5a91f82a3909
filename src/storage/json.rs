//! JSON file-based history store.
//!
//! A small, human-readable store using atomic file writes (write-to-temp +
//! rename) so a crash never leaves a half-written file behind.
//!
//! # Performance Characteristics
//!
//! - **Read**: O(1) lookup, O(n log n) ordered listing, all from memory
//! - **Write**: O(n), serializes the whole dataset
//! - **Best for**: a few thousand packages, one write per user selection

use crate::domain::error::{ApplangError, Result};
use crate::storage::backend::HistoryStore;
use crate::storage::models::HistoryRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const FORMAT_VERSION: u32 = 1;

/// Top-level structure serialized to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryData {
    /// Storage format version for future migrations.
    version: u32,

    /// Rows keyed by package id.
    #[serde(default)]
    packages: HashMap<String, HistoryRecord>,
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            packages: HashMap::new(),
        }
    }
}

/// JSON file history store.
///
/// The whole dataset lives in memory and is persisted after each modification.
///
/// # Thread Safety
///
/// `Send` but not `Sync`: it is owned by the history worker thread.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "packages": {
///     "org.example.notes": {
///       "package_id": "org.example.notes",
///       "last_selected": 1718000000000,
///       "created_at": 1717000000000
///     }
///   }
/// }
/// ```
pub struct JsonHistoryStore {
    file_path: PathBuf,
    data: HistoryData,
    dirty: bool,
}

impl JsonHistoryStore {
    /// Creates or opens a store at `file_path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - The file exists but contains invalid JSON
    /// - The file cannot be read
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use applang::storage::JsonHistoryStore;
    /// use std::path::PathBuf;
    ///
    /// let store = JsonHistoryStore::new(PathBuf::from("/tmp/history.json"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "initializing history store");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("initializing new empty history");
            HistoryData::default()
        };

        tracing::debug!(packages = data.packages.len(), "history store initialized");

        Ok(Self {
            file_path,
            data,
            dirty: false,
        })
    }

    fn load_from_file(path: &Path) -> Result<HistoryData> {
        let contents = std::fs::read_to_string(path)?;
        let data: HistoryData = serde_json::from_str(&contents)
            .map_err(|e| ApplangError::Storage(format!("failed to parse JSON: {e}")))?;

        if data.version > FORMAT_VERSION {
            return Err(ApplangError::Storage(format!(
                "unsupported history format version {}",
                data.version
            )));
        }

        tracing::debug!(version = data.version, packages = data.packages.len(), "loaded history");
        Ok(data)
    }

    fn save_to_file(&mut self) -> Result<()> {
        if !self.dirty {
            tracing::trace!("skipping save, no changes");
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| ApplangError::Storage(format!("failed to serialize JSON: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        self.dirty = false;
        tracing::debug!(path = ?self.file_path, "history saved");
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn find_by_package(&self, package_id: &str) -> Result<Option<HistoryRecord>> {
        Ok(self.data.packages.get(package_id).cloned())
    }

    fn insert(&mut self, record: &HistoryRecord) -> Result<()> {
        let _span = tracing::debug_span!("json_insert", package_id = %record.package_id).entered();

        if self.data.packages.contains_key(&record.package_id) {
            tracing::debug!("row exists, keeping it");
            return Ok(());
        }
        self.data
            .packages
            .insert(record.package_id.clone(), record.clone());

        self.dirty = true;
        self.save_to_file()
    }

    fn set_last_selected(&mut self, package_id: &str, timestamp: i64) -> Result<()> {
        let _span = tracing::debug_span!("json_set_last_selected",
            package_id = %package_id,
            timestamp = timestamp
        )
        .entered();

        let record = self
            .data
            .packages
            .get_mut(package_id)
            .ok_or_else(|| ApplangError::Storage(format!("package not found: {package_id}")))?;
        record.last_selected = Some(timestamp);

        self.dirty = true;
        self.save_to_file()
    }

    fn clear_last_selected_all(&mut self) -> Result<()> {
        let _span = tracing::debug_span!("json_clear_last_selected_all").entered();

        let mut cleared = 0usize;
        for record in self.data.packages.values_mut() {
            if record.last_selected.take().is_some() {
                cleared += 1;
            }
        }

        tracing::debug!(cleared = cleared, "history cleared");
        if cleared > 0 {
            self.dirty = true;
        }
        self.save_to_file()
    }

    fn list_by_last_selected_desc(&self) -> Result<Vec<HistoryRecord>> {
        let mut records: Vec<HistoryRecord> = self
            .data
            .packages
            .values()
            .filter(|r| r.last_selected.is_some())
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.last_selected
                .cmp(&a.last_selected)
                .then_with(|| a.package_id.cmp(&b.package_id))
        });

        tracing::debug!(count = records.len(), "listed history");
        Ok(records)
    }
}

impl Drop for JsonHistoryStore {
    fn drop(&mut self) {
        if self.dirty {
            tracing::debug!("saving dirty history on drop");
            if let Err(e) = self.save_to_file() {
                tracing::error!(error = %e, "failed to save on drop");
            }
        }
    }
}
