//! # shortcut-core
//!
//! Shared library for the global shortcut bridge containing the accelerator
//! type, the named-event wire protocol, and per-call correlation ids.
//!
//! This crate is used by the controller-side registry and by anything that
//! plays the host role (test harnesses, simulators).  It has zero
//! dependencies on async runtimes, sockets, or OS shortcut APIs.
//!
//! # Architecture overview (for beginners)
//!
//! Two processes cooperate to provide global keyboard shortcuts:
//!
//! - The **controller** holds application logic.  It decides which key
//!   combinations it wants and what should happen when they are pressed.
//! - The **host** owns the native OS facilities.  It performs the actual
//!   registration and reports back when a shortcut fires.
//!
//! They talk over a *bridge* that can only broadcast named events with a
//! payload.  There are no request ids and no replies built in, so this crate
//! defines:
//!
//! - **`domain`**: The [`Accelerator`] string (e.g. `"CmdOrCtrl+Shift+K"`),
//!   validated only for emptiness.  Parsing key syntax is the host's job.
//!
//! - **`protocol`**: The event names, the JSON frame envelope used by network
//!   transports, typed request/event enums, and the [`CorrelationId`] that
//!   routes one query answer back to the one caller waiting for it.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `shortcut_core::Accelerator` instead of `shortcut_core::domain::accelerator::Accelerator`.
pub use domain::accelerator::{Accelerator, AcceleratorError};
pub use protocol::correlation::{CorrelationAllocator, CorrelationId};
pub use protocol::frame::BridgeFrame;
pub use protocol::messages::{HostEvent, HostRequest, ProtocolError};
