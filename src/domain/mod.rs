//! Domain layer for applang.
//!
//! This module contains the core domain types, independent of any channel,
//! storage, or runtime concern.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`app`]: Application records, labels, and the canonical sort
//! - [`locale`]: Locale override lists and their stored encoding
//! - [`mode`]: The active privilege channel
//!
//! # Examples
//!
//! ```
//! use applang::domain::{ApplicationRecord, IconHandle, LabelSet, Result};
//!
//! fn make_record() -> Result<ApplicationRecord> {
//!     Ok(ApplicationRecord::new(
//!         "org.example.notes",
//!         "Notes",
//!         IconHandle::default(),
//!         LabelSet::from_flags(false, true),
//!     ))
//! }
//! ```

pub mod app;
pub mod error;
pub mod locale;
pub mod mode;

pub use app::{canonical_cmp, canonical_sort, AppLabel, ApplicationRecord, IconHandle, LabelSet};
pub use error::{ApplangError, Result};
pub use locale::{LocaleEntry, LocaleOverride};
pub use mode::OperationMode;
