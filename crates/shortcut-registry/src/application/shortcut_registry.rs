//! ShortcutRegistry: the in-process authority for global shortcut bindings.
//!
//! The registry is the only component that maps accelerators to callbacks and
//! the only one that translates between those bindings and bridge events:
//!
//! | Call               | Local effect                      | Bridge effect                               |
//! |--------------------|-----------------------------------|---------------------------------------------|
//! | `register`         | insert if absent                  | (new key only) `on("fired")`, `emit("register")` |
//! | `is_registered`    | none                              | `on("query-completed:<id>")`, `emit("query")` |
//! | `unregister`       | remove if present                 | `emit("unregister")` always                 |
//! | `unregister_all`   | clear                             | `emit("unregister-all")`                    |
//!
//! # Locking
//!
//! The binding table sits behind one `std::sync::Mutex`.  Every access is an
//! O(1) map operation, so a single coarse lock is enough.  The lock is never
//! held while emitting on the bridge or while running a user callback, so a
//! callback may itself register or unregister shortcuts.
//!
//! # Failure model
//!
//! Registration conflicts are resolved silently by the host, as operating
//! systems do.  The only failure a caller ever sees from these methods is an
//! empty accelerator, rejected before anything is emitted.  Transport errors
//! are logged and dropped: every request is fire-and-forget.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use shortcut_core::protocol::events;
use shortcut_core::{Accelerator, AcceleratorError, CorrelationAllocator, HostRequest};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::registration_query::RegistrationQuery;
use crate::domain::{BindingTable, RegistryConfig, ShortcutCallback};
use crate::infrastructure::bridge::Bridge;

/// Errors returned by registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The accelerator was empty or whitespace-only.
    #[error("invalid accelerator: {0}")]
    InvalidAccelerator(#[from] AcceleratorError),

    /// The process-wide registry was requested before a bridge was connected.
    #[error("no bridge connected; call connect_bridge first")]
    BridgeNotConnected,

    /// A process-wide bridge was already connected.
    #[error("a bridge is already connected to this process")]
    BridgeAlreadyConnected,
}

/// Maps accelerators to callbacks and speaks to the host over a [`Bridge`].
///
/// Most applications use the single process-wide instance from
/// [`crate::application::instance`]; tests build independent registries
/// with [`ShortcutRegistry::new`].
pub struct ShortcutRegistry {
    bridge: Arc<dyn Bridge>,
    bindings: Arc<Mutex<BindingTable>>,
    correlations: CorrelationAllocator,
    query_timeout: Option<Duration>,
}

impl ShortcutRegistry {
    /// Creates a registry that waits indefinitely for query answers.
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self {
            bridge,
            bindings: Arc::new(Mutex::new(BindingTable::new())),
            correlations: CorrelationAllocator::new(),
            query_timeout: None,
        }
    }

    /// Creates a registry that applies the configured default query deadline.
    pub fn with_config(bridge: Arc<dyn Bridge>, config: &RegistryConfig) -> Self {
        Self {
            query_timeout: config.query_timeout(),
            ..Self::new(bridge)
        }
    }

    /// Returns the process-wide registry.  See [`crate::application::instance`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BridgeNotConnected`] if no process bridge has
    /// been connected yet.
    pub fn instance() -> Result<&'static ShortcutRegistry, RegistryError> {
        super::instance::instance()
    }

    /// Asks the host to own `accelerator` and runs `callback` whenever it fires.
    ///
    /// If `accelerator` is already bound locally this call does nothing: the
    /// existing callback stays, `callback` is dropped, and no request is sent.
    ///
    /// Whether the OS actually granted the shortcut is never reported here;
    /// use [`ShortcutRegistry::is_registered`] to ask the host.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidAccelerator`] if `accelerator` is empty.
    pub fn register<F>(&self, accelerator: &str, callback: F) -> Result<(), RegistryError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let accelerator = Accelerator::parse(accelerator)?;
        let callback: ShortcutCallback = Arc::new(callback);

        let inserted = self
            .lock_bindings()
            .insert_if_absent(accelerator.clone(), callback);
        if !inserted {
            debug!("'{accelerator}' is already bound; ignoring duplicate registration");
            return Ok(());
        }

        self.install_dispatch();
        self.send(&HostRequest::Register(accelerator));
        Ok(())
    }

    /// Asks the host whether `accelerator` is currently registered by anyone.
    ///
    /// Each call allocates its own correlation id, so concurrent queries for
    /// the same accelerator never see each other's answers.  The returned
    /// future has no deadline unless one was configured or added with
    /// [`RegistrationQuery::with_timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidAccelerator`] if `accelerator` is empty.
    pub fn is_registered(&self, accelerator: &str) -> Result<RegistrationQuery, RegistryError> {
        let accelerator = Accelerator::parse(accelerator)?;
        let correlation = self.correlations.next();
        let channel = correlation.channel();
        let (answer_tx, answer_rx) = oneshot::channel();

        // Subscribe before emitting so a fast answer cannot be missed.
        self.bridge
            .on(&channel, one_shot_handler(&self.bridge, channel.clone(), answer_tx));

        let request = HostRequest::Query {
            accelerator: accelerator.clone(),
            correlation,
        };
        if !self.send(&request) {
            // Nothing will ever answer; dropping the handler closes the
            // oneshot so the query resolves with `ChannelClosed`.
            self.bridge.off(&channel);
        }

        Ok(
            RegistrationQuery::new(accelerator, correlation, answer_rx, Arc::clone(&self.bridge))
                .with_optional_timeout(self.query_timeout),
        )
    }

    /// Removes the local binding (if any) and asks the host to release
    /// `accelerator`.
    ///
    /// The release request is sent even when nothing was bound locally: the
    /// caller may be referring to a host-side registration this process does
    /// not track.  No acknowledgement is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidAccelerator`] if `accelerator` is empty.
    pub fn unregister(&self, accelerator: &str) -> Result<(), RegistryError> {
        let accelerator = Accelerator::parse(accelerator)?;

        if !self.lock_bindings().remove(accelerator.as_str()) {
            debug!("'{accelerator}' was not bound locally; sending release anyway");
        }

        self.send(&HostRequest::Unregister(accelerator));
        Ok(())
    }

    /// Clears every local binding and asks the host to release everything.
    ///
    /// The shared `fired` subscription stays installed; with no bindings left
    /// it simply matches nothing until the next registration.
    pub fn unregister_all(&self) {
        let cleared = self.lock_bindings().clear();
        debug!("cleared {cleared} local binding(s)");
        self.send(&HostRequest::UnregisterAll);
    }

    /// Returns the accelerators bound locally, sorted.
    pub fn registered_accelerators(&self) -> Vec<String> {
        self.lock_bindings()
            .accelerators()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Returns `true` if `accelerator` is bound in this process.
    ///
    /// This is local bookkeeping only; see [`ShortcutRegistry::is_registered`]
    /// for the host's view.
    pub fn is_bound_locally(&self, accelerator: &str) -> bool {
        self.lock_bindings().contains(accelerator)
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// (Re)installs the shared `fired` handler.
    ///
    /// Only one handler is ever needed, and `on` replaces the previous one,
    /// so repeating this is harmless.
    fn install_dispatch(&self) {
        let bindings = Arc::clone(&self.bindings);
        self.bridge.on(
            events::FIRED,
            Arc::new(move |payload: Value| {
                dispatch_fired(&bindings, &payload);
            }),
        );
    }

    /// Emits `request`, logging (not returning) any transport failure.
    ///
    /// Returns `true` if the bridge accepted the emission.
    fn send(&self, request: &HostRequest) -> bool {
        match self.bridge.emit(request.event_name(), request.args()) {
            Ok(()) => {
                trace!("emitted {request:?}");
                true
            }
            Err(e) => {
                warn!("failed to emit '{}': {e}", request.event_name());
                false
            }
        }
    }

    fn lock_bindings(&self) -> MutexGuard<'_, BindingTable> {
        lock(&self.bindings)
    }
}

/// Runs the callback bound to the accelerator named in a `fired` payload.
///
/// Returns `true` if a callback ran.  Unknown accelerators are expected (the
/// host may report a shortcut that was just unregistered) and are ignored.
pub(crate) fn dispatch_fired(bindings: &Mutex<BindingTable>, payload: &Value) -> bool {
    let Some(accelerator) = payload.as_str() else {
        warn!("ignoring '{}' event with non-string payload: {payload}", events::FIRED);
        return false;
    };

    // Clone the callback out so the lock is released before user code runs.
    let callback = lock(bindings).callback(accelerator);
    match callback {
        Some(callback) => {
            debug!("dispatching '{accelerator}'");
            callback();
            true
        }
        None => {
            debug!("no local binding for fired accelerator '{accelerator}'");
            false
        }
    }
}

/// Builds the handler for one query channel.
///
/// The first boolean payload takes the sender out of the latch, unsubscribes
/// the channel, and resolves the query.  Anything after that is ignored.
fn one_shot_handler(
    bridge: &Arc<dyn Bridge>,
    channel: String,
    answer_tx: oneshot::Sender<bool>,
) -> crate::infrastructure::bridge::EventHandler {
    // Weak: the handler is stored inside the bridge, so a strong reference
    // would keep the bridge alive through its own handler table.
    let bridge = Arc::downgrade(bridge);
    let latch = Mutex::new(Some(answer_tx));

    Arc::new(move |payload: Value| {
        let Some(registered) = payload.as_bool() else {
            warn!("ignoring non-boolean answer on '{channel}': {payload}");
            return;
        };
        let Some(answer_tx) = lock(&latch).take() else {
            debug!("duplicate answer on '{channel}' ignored");
            return;
        };
        if let Some(bridge) = bridge.upgrade() {
            bridge.off(&channel);
        }
        // The caller may have dropped the query already; that is fine.
        let _ = answer_tx.send(registered);
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
