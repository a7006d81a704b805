//! Application layer for shortcut-registry.
//!
//! The application layer knows *what* to send and *how to interpret* what
//! comes back, but delegates the actual transport to whatever [`Bridge`]
//! it was given.
//!
//! # Responsibilities
//!
//! - Keeping the local binding table in step with the caller's intent
//! - Translating registry calls into bridge emissions and subscriptions
//! - Routing `fired` events to the owning callback
//! - Correlating each status query with its one-shot answer
//! - Providing the single process-wide registry instance
//!
//! [`Bridge`]: crate::infrastructure::bridge::Bridge

pub mod instance;
pub mod registration_query;
pub mod shortcut_registry;

pub use instance::{connect_bridge, connect_bridge_with_config, instance};
pub use registration_query::{QueryError, RegistrationQuery};
pub use shortcut_registry::{RegistryError, ShortcutRegistry};
