//! Operation mode: which elevated channel, if any, is in use.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The privilege channel selected by the last probe.
///
/// Written only by [`crate::privilege::ChannelProbe`]; everything else reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationMode {
    /// No elevated channel. Browsing and search still work, editing does not.
    #[default]
    None,
    /// A superuser shell session granted root.
    Root,
    /// The secondary IPC broker service is reachable and permission is held.
    BrokerService,
}

impl OperationMode {
    /// Returns `true` if locale overrides can be read and written.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Root => "root",
            Self::BrokerService => "broker",
        })
    }
}
