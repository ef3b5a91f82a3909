//! Infrastructure: paths and the host-facing collaborator implementations.
//!
//! - `paths`: data directory and tilde expansion
//! - `su`: a persistent `su` child process implementing [`crate::privilege::ShellSession`]
//! - `manifest`: a JSON package list implementing [`crate::directory::PackageInfo`]

pub mod manifest;
pub mod paths;
pub mod su;

pub use manifest::ManifestPackageInfo;
pub use paths::{default_data_dir, expand_tilde, HISTORY_FILE_NAME};
pub use su::SuShell;
