//! Domain layer for shortcut-registry.
//!
//! Pure types with no dependencies on I/O, async runtimes, or transports.
//!
//! # What belongs in the domain layer?
//!
//! - The binding table (accelerator → callback) and its rules
//! - Configuration structures
//!
//! # What does NOT belong here?
//!
//! - Anything that emits on, or subscribes to, the bridge
//! - File I/O or environment variable reading

pub mod bindings;
pub mod config;

pub use bindings::{BindingTable, ShortcutCallback};
pub use config::{BridgeSection, LoggingSection, RegistryConfig, RegistrySection};
