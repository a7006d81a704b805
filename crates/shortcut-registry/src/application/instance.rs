//! The single process-wide registry.
//!
//! A process owns exactly one set of global shortcuts, so it gets exactly one
//! [`ShortcutRegistry`].  The embedding application connects a bridge once at
//! startup; after that any thread may call [`instance`] and all callers share
//! the same registry.
//!
//! ```text
//! main()                         any thread, any time
//! ──────                         ────────────────────
//! connect_bridge(bridge)  ──►    instance()  → &'static ShortcutRegistry
//! ```
//!
//! Both cells are `once_cell::sync::OnceCell`, so concurrent first calls to
//! [`instance`] race safely: one initializer runs and everyone gets its result.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use super::shortcut_registry::{RegistryError, ShortcutRegistry};
use crate::domain::RegistryConfig;
use crate::infrastructure::bridge::Bridge;

struct ProcessBridge {
    bridge: Arc<dyn Bridge>,
    config: RegistryConfig,
}

static PROCESS_BRIDGE: OnceCell<ProcessBridge> = OnceCell::new();
static REGISTRY: OnceCell<ShortcutRegistry> = OnceCell::new();

/// Connects the bridge the process-wide registry will use, with default
/// settings.
///
/// # Errors
///
/// Returns [`RegistryError::BridgeAlreadyConnected`] if a bridge was
/// connected before.  The first bridge stays in place.
pub fn connect_bridge(bridge: Arc<dyn Bridge>) -> Result<(), RegistryError> {
    connect_bridge_with_config(bridge, RegistryConfig::default())
}

/// Connects the process bridge and the settings the registry is built with.
///
/// # Errors
///
/// Returns [`RegistryError::BridgeAlreadyConnected`] if a bridge was
/// connected before.
pub fn connect_bridge_with_config(
    bridge: Arc<dyn Bridge>,
    config: RegistryConfig,
) -> Result<(), RegistryError> {
    PROCESS_BRIDGE
        .set(ProcessBridge { bridge, config })
        .map_err(|_| RegistryError::BridgeAlreadyConnected)?;
    info!("process bridge connected");
    Ok(())
}

/// Returns the process-wide registry, creating it on first use.
///
/// # Errors
///
/// Returns [`RegistryError::BridgeNotConnected`] until [`connect_bridge`]
/// has been called.
pub fn instance() -> Result<&'static ShortcutRegistry, RegistryError> {
    REGISTRY.get_or_try_init(|| {
        let process = PROCESS_BRIDGE
            .get()
            .ok_or(RegistryError::BridgeNotConnected)?;
        Ok(ShortcutRegistry::with_config(
            Arc::clone(&process.bridge),
            &process.config,
        ))
    })
}
