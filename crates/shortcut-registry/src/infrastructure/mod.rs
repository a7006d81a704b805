//! Infrastructure layer for shortcut-registry.
//!
//! Everything that touches the outside world lives here.
//!
//! # Responsibilities
//!
//! - Defining the [`bridge::Bridge`] seam and its concrete transports
//! - Reading and writing the TOML configuration file
//! - Installing the global `tracing` subscriber
//!
//! # What does NOT belong here?
//!
//! - Binding bookkeeping or query correlation (that is the application layer)

pub mod bridge;
pub mod logging;
pub mod storage;

pub use bridge::{Bridge, BridgeError, EventHandler, InMemoryBridge, WsBridge};
