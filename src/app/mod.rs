//! Application layer: session state and the operations that change it.
//!
//! ```text
//! Presentation → Event → handle_event → Session → watch::Sender<SessionState>
//!                                          │               │
//!                       probe / builder / search / history └──▶ subscribers
//! ```
//!
//! # Modules
//!
//! - [`state`]: the renderable snapshot
//! - [`session`]: the single state owner and its operations
//! - [`handler`]: event dispatch for the presentation layer

pub mod handler;
pub mod session;
pub mod state;

pub use handler::{handle_event, Event};
pub use session::{Session, SessionParts};
pub use state::{Notification, SessionState};
