//! Filesystem locations.

use std::path::PathBuf;

/// Directory name under the platform data directory.
pub const APP_DIR_NAME: &str = "applang";

/// History file name inside the data directory.
pub const HISTORY_FILE_NAME: &str = "history.json";

/// Returns the default data directory.
///
/// `$XDG_DATA_HOME/applang` (usually `~/.local/share/applang`) on Linux, the
/// platform equivalent elsewhere, or `./applang` if no data directory is known.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Expands a leading `~` to the home directory.
///
/// # Examples
///
/// ```
/// use applang::infrastructure::expand_tilde;
/// use std::path::PathBuf;
///
/// assert_eq!(expand_tilde("/absolute/path"), PathBuf::from("/absolute/path"));
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if path == "~" {
        home()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home().join(rest)
    } else {
        PathBuf::from(path)
    }
}
