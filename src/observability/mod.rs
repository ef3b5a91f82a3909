//! Structured logging to a rotating file.
//!
//! `tracing` spans and events from every layer end up in
//! `<data dir>/applang.log`, which rotates at 10 MB and keeps 3 backups.
//!
//! ```text
//! tracing macros → EnvFilter → fmt layer → FileWriter → applang.log
//! ```
//!
//! # Configuration
//!
//! Level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` config option
//! 3. Default: `"info"`
//!
//! # Modules
//!
//! - [`init`]: subscriber setup
//! - `file_writer`: rotating file writer

mod file_writer;
pub mod init;

pub use file_writer::FileWriter;
pub use init::{init_tracing, LOG_FILE_NAME};
