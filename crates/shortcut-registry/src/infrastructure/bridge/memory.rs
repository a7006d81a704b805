//! In-process bridge for tests and single-process embedders.
//!
//! Emissions are recorded instead of sent anywhere, and the caller plays the
//! host by calling [`InMemoryBridge::deliver`].  Delivery runs the handler on
//! the calling thread, which makes it easy to simulate the host's independent
//! delivery context from any number of test threads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use shortcut_core::{BridgeFrame, HostEvent, HostRequest};
use tracing::trace;

use super::{Bridge, BridgeError, EventHandler};

/// A [`Bridge`] that records emissions and delivers events in-process.
#[derive(Default)]
pub struct InMemoryBridge {
    handlers: Mutex<HashMap<String, EventHandler>>,
    emitted: Mutex<Vec<BridgeFrame>>,
    disconnected: AtomicBool,
}

impl InMemoryBridge {
    /// Creates a connected bridge with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `payload` to the handler subscribed to `event`.
    ///
    /// Returns `true` if a handler was subscribed.  The handler runs after the
    /// handler-table lock is released, so it may call `on`/`off` freely.
    pub fn deliver(&self, event: &str, payload: Value) -> bool {
        let handler = lock(&self.handlers).get(event).cloned();
        match handler {
            Some(handler) => {
                trace!("delivering '{event}'");
                handler(payload);
                true
            }
            None => {
                trace!("no handler for '{event}'; dropped");
                false
            }
        }
    }

    /// Delivers a typed host event.  See [`InMemoryBridge::deliver`].
    pub fn deliver_event(&self, event: &HostEvent) -> bool {
        self.deliver(&event.event_name(), event.payload())
    }

    /// Returns a copy of every frame emitted so far, oldest first.
    pub fn emitted(&self) -> Vec<BridgeFrame> {
        lock(&self.emitted).clone()
    }

    /// Returns and clears the recorded frames.
    pub fn take_emitted(&self) -> Vec<BridgeFrame> {
        std::mem::take(&mut *lock(&self.emitted))
    }

    /// Returns the emitted frames parsed as [`HostRequest`]s.
    ///
    /// Frames that do not parse (which the registry never produces) are skipped.
    pub fn emitted_requests(&self) -> Vec<HostRequest> {
        lock(&self.emitted)
            .iter()
            .filter_map(|frame| HostRequest::from_frame(frame).ok())
            .collect()
    }

    /// Returns `true` if a handler is subscribed to `event`.
    pub fn has_handler(&self, event: &str) -> bool {
        lock(&self.handlers).contains_key(event)
    }

    /// Returns the subscribed event names, sorted.
    pub fn subscriptions(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.handlers).keys().cloned().collect();
        names.sort();
        names
    }

    /// Simulates losing (or regaining) the connection to the host.
    ///
    /// While disconnected, `emit` fails with [`BridgeError::Disconnected`] and
    /// nothing is recorded.
    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::Release);
    }
}

impl Bridge for InMemoryBridge {
    fn emit(&self, event: &str, args: Vec<Value>) -> Result<(), BridgeError> {
        if self.disconnected.load(Ordering::Acquire) {
            return Err(BridgeError::Disconnected);
        }
        lock(&self.emitted).push(BridgeFrame::new(event, args));
        Ok(())
    }

    fn on(&self, event: &str, handler: EventHandler) {
        lock(&self.handlers).insert(event.to_string(), handler);
    }

    fn off(&self, event: &str) {
        lock(&self.handlers).remove(event);
    }
}

/// Locks `mutex`, recovering the data if a previous holder panicked.
///
/// A panicking test callback must not wedge every later delivery.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
