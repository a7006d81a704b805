//! The bridge seam: a one-way, name-keyed publish/subscribe channel.
//!
//! The registry never talks to a socket directly.  It only needs three
//! primitives, captured by the [`Bridge`] trait:
//!
//! | Primitive        | Meaning                                                   |
//! |------------------|-----------------------------------------------------------|
//! | `emit`           | Fire-and-forget: send `(event, args)` to the host         |
//! | `on`             | Install *the* handler for an event name (replaces any old)|
//! | `off`            | Remove the handler for an event name (no-op if absent)    |
//!
//! # Testability
//!
//! Production code uses [`ws::WsBridge`]; tests and single-process embedders
//! use [`memory::InMemoryBridge`], which records emissions and lets the test
//! play the host by delivering events by hand.
//!
//! # Re-entrancy contract
//!
//! Implementations must not hold their handler-table lock while a handler
//! runs.  Query handlers call `off` on their own channel from inside the
//! handler, and a user callback may call back into the registry.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod ws;

pub use memory::InMemoryBridge;
pub use ws::WsBridge;

/// Handler invoked with the first payload argument of an inbound event.
///
/// Events with no arguments deliver `Value::Null`.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync + 'static>;

/// Errors a transport can report when emitting.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The connection to the host is gone.
    #[error("bridge is disconnected")]
    Disconnected,

    /// The event could not be encoded for the wire.
    #[error("failed to encode bridge frame: {0}")]
    Encode(String),
}

/// A named-event transport between this process and the host.
#[cfg_attr(test, mockall::automock)]
pub trait Bridge: Send + Sync {
    /// Sends `event` with positional `args` to the host.
    fn emit(&self, event: &str, args: Vec<Value>) -> Result<(), BridgeError>;

    /// Installs `handler` for `event`, replacing any existing handler.
    fn on(&self, event: &str, handler: EventHandler);

    /// Removes the handler for `event`, if any.
    fn off(&self, event: &str);
}
