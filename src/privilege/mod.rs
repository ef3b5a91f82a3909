//! Privilege channels.
//!
//! Everything that needs elevated rights goes through this module. The probe
//! picks a channel, the service talks to it, and the rest of the crate only
//! ever sees [`PrivilegedLocaleService`] and the shared [`ModeCell`].
//!
//! ```text
//!  ChannelProbe ──writes──▶ ModeCell ◀──reads── PrivilegedLocaleService
//!      │                                            │
//!      ├── ShellSession (su)                        ├── ShellLocaleChannel
//!      └── BrokerService                            └── BrokerLocaleChannel
//! ```
//!
//! # Modules
//!
//! - `context`: the shared mode cell
//! - `channel`: the [`LocaleChannel`] capability trait and input validation
//! - `shell`: root shell session trait and its channel
//! - `broker`: broker service traits and its channel
//! - `probe`: channel discovery
//! - `service`: the facade

pub mod broker;
pub mod channel;
pub mod context;
pub mod probe;
pub mod service;
pub mod shell;

pub use broker::{BrokerConnection, BrokerLocaleChannel, BrokerService, NoBroker};
pub use channel::LocaleChannel;
pub use context::ModeCell;
pub use probe::{ChannelProbe, RootListener};
pub use service::PrivilegedLocaleService;
pub use shell::{shared_shell, SharedShell, ShellLocaleChannel, ShellOutput, ShellSession};
