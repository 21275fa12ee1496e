//! Outbound message dispatch.
//!
//! A structured [`SendRequest`] from the queued-file reader or the
//! command parser is classified (text vs media kind), routed to the
//! single-chat or group-chat path, @-mention targets are resolved, and the
//! send goes out through the active backend adapter. The queue module
//! drains a JSON queue file, optionally triggered by a debounced
//! filesystem watcher.

pub mod classify;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod queue;
pub mod request;
pub mod watcher;

pub use {
    classify::classify,
    command::parse_send_command,
    dispatcher::Dispatcher,
    error::{Error, Result},
    queue::{QueueDrainer, QueuedMessage},
    request::{Origin, SendRequest},
    watcher::QueueWatcher,
};
