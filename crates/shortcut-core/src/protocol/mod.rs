//! Protocol module containing event names, the frame envelope, typed
//! messages, and correlation ids.

pub mod correlation;
pub mod events;
pub mod frame;
pub mod messages;

pub use correlation::{CorrelationAllocator, CorrelationId};
pub use frame::BridgeFrame;
pub use messages::{HostEvent, HostRequest, ProtocolError};
