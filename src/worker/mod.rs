//! Background worker thread for history storage.
//!
//! # Architecture
//!
//! - `messages`: request/response protocol types
//! - `handler`: the worker thread and its message processing

pub mod handler;
pub mod messages;

pub use handler::{Envelope, HistoryWorker};
pub use messages::{WorkerMessage, WorkerResponse};
