//! Error types for applang.
//!
//! This module defines the centralized error type [`ApplangError`] and a type alias
//! [`Result`] used throughout the crate. All errors are implemented using the
//! `thiserror` crate for automatic `Error` trait implementation.
//!
//! The privilege-related variants form a small taxonomy that callers branch on:
//!
//! | Variant              | Meaning                                         | Handling                     |
//! |----------------------|-------------------------------------------------|------------------------------|
//! | `ChannelUnavailable` | a probe could not establish a channel           | folded into `NONE`           |
//! | `PrivilegeLost`      | an established channel died mid-operation       | surfaced, caller re-probes   |
//! | `NotPrivileged`      | privileged call while the mode is `NONE`        | rejected, prompt for access  |
//! | `StaleResult`        | a superseded search/build tried to publish      | discarded silently           |

use thiserror::Error;

/// The main error type for applang operations.
///
/// # Examples
///
/// ```
/// use applang::ApplangError;
///
/// let err = ApplangError::PrivilegeLost("shell exited".to_string());
/// assert!(err.is_privilege_lost());
/// assert!(!ApplangError::NotPrivileged.is_privilege_lost());
/// ```
#[derive(Debug, Error)]
pub enum ApplangError {
    /// A privilege channel could not be established.
    ///
    /// Produced while probing (shell spawn failure, broker unreachable). Never
    /// fatal: the probe falls through to the next channel or to `NONE`.
    #[error("Channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// An established privilege channel died in the middle of an operation.
    ///
    /// Distinct from "no override set". Callers should re-run the probe rather
    /// than retry the same call.
    #[error("Privilege lost: {0}")]
    PrivilegeLost(String),

    /// A privileged operation was requested while the operation mode is `NONE`.
    #[error("Not privileged: no elevated channel is active")]
    NotPrivileged,

    /// A search or directory build finished after a newer one was started.
    #[error("Stale result from generation {generation} (latest is {latest})")]
    StaleResult {
        /// Generation of the superseded task.
        generation: u64,
        /// Latest generation at the time of the check.
        latest: u64,
    },

    /// The package-info collaborator failed or returned malformed data.
    #[error("Package error: {0}")]
    Package(String),

    /// History storage read or write failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Communication with the history worker thread failed.
    #[error("Worker communication error: {0}")]
    Worker(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or process I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApplangError {
    /// Returns `true` when the error means the elevated channel died and the
    /// caller should re-run the probe.
    #[must_use]
    pub const fn is_privilege_lost(&self) -> bool {
        matches!(self, Self::PrivilegeLost(_))
    }
}

/// A specialized `Result` type for applang operations.
pub type Result<T> = std::result::Result<T, ApplangError>;
