//! Locale channel capability interface.
//!
//! [`LocaleChannel`] is what the locale service talks to. There are two
//! implementations, selected by the probe's result:
//!
//! - [`ShellLocaleChannel`](super::ShellLocaleChannel): runs `cmd locale` through the root shell
//! - [`BrokerLocaleChannel`](super::BrokerLocaleChannel): calls the broker service's remote methods
//!
//! Each implementation admits one in-flight request at a time. Concurrent
//! callers queue on the channel's lock instead of opening a second session.

use crate::domain::{ApplangError, LocaleOverride, OperationMode, Result};
use async_trait::async_trait;

/// Reads and writes per-application locale overrides over an elevated channel.
///
/// # Errors
///
/// Implementations return [`ApplangError::PrivilegeLost`] when the underlying
/// session or connection died. "No override" is `Ok` with an empty
/// [`LocaleOverride`], never an error.
#[async_trait]
pub trait LocaleChannel: Send + Sync {
    /// The operation mode this channel serves.
    fn kind(&self) -> OperationMode;

    /// Returns the current override for `package_id`.
    async fn get_override(&self, package_id: &str) -> Result<LocaleOverride>;

    /// Replaces the override for `package_id`. An empty override resets it.
    async fn set_override(&self, package_id: &str, locales: &LocaleOverride) -> Result<()>;
}

/// Checks that a package identifier is safe to hand to a channel.
///
/// Package ids are dot-separated segments of ASCII letters, digits and
/// underscores. The shell channel interpolates them into a command line, so
/// anything else is rejected up front.
///
/// # Errors
///
/// Returns [`ApplangError::Package`] if the identifier is malformed.
pub fn validate_package_id(package_id: &str) -> Result<()> {
    let valid = !package_id.is_empty()
        && package_id
            .split('.')
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if valid {
        Ok(())
    } else {
        Err(ApplangError::Package(format!("invalid package id: {package_id:?}")))
    }
}

/// Checks that every language tag in an override is well formed.
///
/// # Errors
///
/// Returns [`ApplangError::Package`] naming the first malformed tag.
pub fn validate_language_tags(locales: &LocaleOverride) -> Result<()> {
    for entry in locales.entries() {
        let tag = entry.language_tag.as_str();
        let valid = !tag.is_empty()
            && tag
                .split('-')
                .all(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()));
        if !valid {
            return Err(ApplangError::Package(format!("invalid language tag: {tag:?}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_ids() {
        assert!(validate_package_id("com.android.settings").is_ok());
        assert!(validate_package_id("org.example_app.v2").is_ok());
        assert!(validate_package_id("").is_err());
        assert!(validate_package_id("com..x").is_err());
        assert!(validate_package_id("com.x; reboot").is_err());
    }

    #[test]
    fn language_tags() {
        assert!(validate_language_tags(&LocaleOverride::from_tags(["en-US", "zh-Hant-TW"])).is_ok());
        assert!(validate_language_tags(&LocaleOverride::none()).is_ok());
        assert!(validate_language_tags(&LocaleOverride::from_tags(["en US"])).is_err());
        assert!(validate_language_tags(&LocaleOverride::from_tags(["fr-"])).is_err());
    }
}
