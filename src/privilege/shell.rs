//! Superuser shell channel.
//!
//! The shell session itself is an external collaborator ([`ShellSession`]);
//! the production implementation lives in [`crate::infrastructure::su`]. This
//! module adapts a session into a [`LocaleChannel`] by running the platform's
//! `cmd locale` commands through it.
//!
//! # Command protocol
//!
//! ```text
//! $ cmd locale get-app-locales org.example.notes
//! Locales for org.example.notes for user 0 are [pt-BR,en]
//! $ cmd locale set-app-locales org.example.notes --locales pt-BR,en
//! ```
//!
//! Empty brackets mean no override. Setting an empty tag list resets it.

use super::channel::{validate_language_tags, validate_package_id, LocaleChannel};
use crate::domain::{ApplangError, LocaleOverride, OperationMode, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// Result of one command run through a shell session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    /// Exit status reported by the shell.
    pub exit_code: i32,
    /// Lines written to standard output.
    pub stdout: Vec<String>,
}

impl ShellOutput {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// An out-of-process superuser shell session.
///
/// All methods block; callers run them on the blocking pool.
pub trait ShellSession: Send {
    /// Returns `true` if the session process is still running.
    fn is_alive(&mut self) -> bool;

    /// Terminates the session. Closing a dead session is a no-op.
    fn close(&mut self);

    /// Starts a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`ApplangError::ChannelUnavailable`] if the shell cannot be spawned.
    fn open(&mut self) -> Result<()>;

    /// Returns `true` if the open session is running as root.
    fn is_root_granted(&mut self) -> bool;

    /// Runs one command and collects its output.
    ///
    /// # Errors
    ///
    /// Returns [`ApplangError::PrivilegeLost`] if the session died before or
    /// during the command.
    fn exec(&mut self, command: &str) -> Result<ShellOutput>;
}

/// A shell session shared between the probe and the shell channel.
///
/// The mutex is the "one in-flight request" guarantee for the root channel.
pub type SharedShell = Arc<Mutex<Box<dyn ShellSession>>>;

/// Wraps a session so it can be shared.
pub fn shared_shell(session: impl ShellSession + 'static) -> SharedShell {
    Arc::new(Mutex::new(Box::new(session)))
}

/// Runs `f` against the shared session on the blocking pool.
pub(crate) async fn with_session<T, F>(shell: &SharedShell, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn ShellSession) -> Result<T> + Send + 'static,
{
    let shell = Arc::clone(shell);
    tokio::task::spawn_blocking(move || {
        let mut session = shell.lock().unwrap_or_else(PoisonError::into_inner);
        f(session.as_mut())
    })
    .await
    .map_err(|e| ApplangError::Worker(format!("shell task failed: {e}")))?
}

/// Extracts the override from `get-app-locales` output.
///
/// # Errors
///
/// Returns [`ApplangError::Package`] if the output has no bracketed list.
pub fn parse_app_locales(stdout: &[String]) -> Result<LocaleOverride> {
    let joined = stdout.join("\n");
    let list = joined
        .rfind('[')
        .and_then(|open| {
            joined[open + 1..]
                .find(']')
                .map(|close| &joined[open + 1..open + 1 + close])
        })
        .ok_or_else(|| ApplangError::Package(format!("unexpected get-app-locales output: {joined:?}")))?;
    Ok(LocaleOverride::parse_tag_list(list))
}

/// [`LocaleChannel`] backed by the root shell.
pub struct ShellLocaleChannel {
    shell: SharedShell,
}

impl ShellLocaleChannel {
    #[must_use]
    pub const fn new(shell: SharedShell) -> Self {
        Self { shell }
    }

    async fn run(&self, command: String) -> Result<ShellOutput> {
        with_session(&self.shell, move |session| {
            if !session.is_alive() {
                return Err(ApplangError::PrivilegeLost("root shell is no longer alive".to_string()));
            }
            session.exec(&command)
        })
        .await
    }
}

#[async_trait]
impl LocaleChannel for ShellLocaleChannel {
    fn kind(&self) -> OperationMode {
        OperationMode::Root
    }

    async fn get_override(&self, package_id: &str) -> Result<LocaleOverride> {
        validate_package_id(package_id)?;
        let output = self.run(format!("cmd locale get-app-locales {package_id}")).await?;
        if !output.is_success() {
            return Err(ApplangError::Package(format!(
                "get-app-locales for {package_id} exited with {}",
                output.exit_code
            )));
        }
        let locales = parse_app_locales(&output.stdout)?;
        tracing::trace!(package_id = %package_id, locales = %locales, "read override via shell");
        Ok(locales)
    }

    async fn set_override(&self, package_id: &str, locales: &LocaleOverride) -> Result<()> {
        validate_package_id(package_id)?;
        validate_language_tags(locales)?;
        let command = format!(
            "cmd locale set-app-locales {package_id} --locales '{}'",
            locales.language_tags()
        );
        let output = self.run(command).await?;
        if !output.is_success() {
            return Err(ApplangError::Package(format!(
                "set-app-locales for {package_id} exited with {}",
                output.exit_code
            )));
        }
        tracing::debug!(package_id = %package_id, locales = %locales, "wrote override via shell");
        Ok(())
    }
}
