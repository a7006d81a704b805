//! shortcut-registry library crate.
//!
//! This crate is the controller side of the global shortcut bridge.  It keeps
//! track of which accelerators this process asked the host to own, routes the
//! host's broadcast `fired` events to the right callback, and turns the
//! host's one-shot query answers into awaitable futures.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Application code (register / is_registered / unregister / unregister_all)
//!         ↕
//! [shortcut-registry]
//!   ├── domain/           Pure types: RegistryConfig, BindingTable
//!   ├── application/      ShortcutRegistry, RegistrationQuery, process instance
//!   └── infrastructure/
//!         ├── bridge/     Bridge trait, InMemoryBridge, WsBridge
//!         ├── storage/    TOML config persistence
//!         └── logging     tracing-subscriber setup
//!         ↕
//! Host process (owns the OS shortcut API)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain`, `shortcut-core`, and the `Bridge`
//!   *trait* only, never on a concrete transport.
//! - `infrastructure` provides the concrete transports and file access.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use shortcut_registry::application::ShortcutRegistry;
//! use shortcut_registry::infrastructure::bridge::InMemoryBridge;
//!
//! let bridge = Arc::new(InMemoryBridge::new());
//! let registry = ShortcutRegistry::new(bridge.clone());
//!
//! registry.register("CmdOrCtrl+X", || println!("cut!")).unwrap();
//! assert!(registry.is_bound_locally("CmdOrCtrl+X"));
//!
//! // The host reports a key press:
//! assert!(bridge.deliver("fired", "CmdOrCtrl+X".into()));
//! ```

/// Domain layer: configuration and the binding table.
pub mod domain;

/// Application layer: the registry and its query futures.
pub mod application;

/// Infrastructure layer: bridge transports, config storage, and logging.
pub mod infrastructure;

pub use application::{QueryError, RegistrationQuery, RegistryError, ShortcutRegistry};
pub use domain::RegistryConfig;
pub use infrastructure::bridge::{Bridge, BridgeError, EventHandler};
