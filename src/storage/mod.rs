//! Storage layer for selection history.
//!
//! # Modules
//!
//! - `backend`: the [`HistoryStore`] trait
//! - `json`: JSON file implementation
//! - `models`: storage record types separate from domain models

pub mod backend;
pub mod json;
pub mod models;

pub use backend::HistoryStore;
pub use json::JsonHistoryStore;
pub use models::HistoryRecord;
