//! Typed bridge messages in both directions.
//!
//! The bridge itself only knows `(event name, args)`.  These enums give each
//! event a typed shape and perform the conversion both ways:
//!
//! ```text
//! controller ──HostRequest──►  host
//!   Register(acc)              "register"        [acc]
//!   Unregister(acc)            "unregister"      [acc]
//!   UnregisterAll              "unregister-all"  []
//!   Query { acc, id }          "query"           [acc, id]
//!
//! controller ◄──HostEvent───  host
//!   Fired(acc)                 "fired"                 [acc]
//!   QueryCompleted { id, b }   "query-completed:<id>"  [b]
//! ```

use serde_json::Value;
use thiserror::Error;

use super::correlation::CorrelationId;
use super::events;
use super::frame::BridgeFrame;
use crate::domain::accelerator::{Accelerator, AcceleratorError};

/// Errors that can occur while interpreting a bridge event.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProtocolError {
    /// The event name is not part of the protocol.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A required positional argument was absent.
    #[error("event '{event}' is missing argument {index}")]
    MissingArgument { event: String, index: usize },

    /// A positional argument had the wrong JSON type.
    #[error("event '{event}' argument {index} must be a {expected}")]
    InvalidArgument {
        event: String,
        index: usize,
        expected: &'static str,
    },

    /// A correlation id string could not be parsed.
    #[error("invalid correlation id: {0}")]
    InvalidCorrelationId(String),

    /// An accelerator argument was empty.
    #[error(transparent)]
    InvalidAccelerator(#[from] AcceleratorError),

    /// A frame could not be encoded or decoded as JSON.
    #[error("malformed frame: {0}")]
    Json(String),
}

// ── Controller → host ─────────────────────────────────────────────────────────

/// A request the controller emits to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    /// Take ownership of the accelerator at the OS level.
    Register(Accelerator),
    /// Release the accelerator.
    Unregister(Accelerator),
    /// Release everything this controller holds.
    UnregisterAll,
    /// Report whether the accelerator is registered (by anyone) on the
    /// channel named by `correlation`.
    Query {
        accelerator: Accelerator,
        correlation: CorrelationId,
    },
}

impl HostRequest {
    /// Returns the event name this request is emitted under.
    pub fn event_name(&self) -> &'static str {
        match self {
            HostRequest::Register(_) => events::REGISTER,
            HostRequest::Unregister(_) => events::UNREGISTER,
            HostRequest::UnregisterAll => events::UNREGISTER_ALL,
            HostRequest::Query { .. } => events::QUERY,
        }
    }

    /// Returns the positional arguments for this request.
    pub fn args(&self) -> Vec<Value> {
        match self {
            HostRequest::Register(acc) | HostRequest::Unregister(acc) => {
                vec![Value::String(acc.to_string())]
            }
            HostRequest::UnregisterAll => Vec::new(),
            HostRequest::Query {
                accelerator,
                correlation,
            } => vec![
                Value::String(accelerator.to_string()),
                Value::String(correlation.to_string()),
            ],
        }
    }

    /// Wraps the request in a [`BridgeFrame`].
    pub fn to_frame(&self) -> BridgeFrame {
        BridgeFrame::new(self.event_name(), self.args())
    }

    /// Interprets a frame received by the host.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the event is unknown or an argument is
    /// missing or mistyped.
    pub fn from_frame(frame: &BridgeFrame) -> Result<Self, ProtocolError> {
        let event = frame.event.as_str();
        match event {
            events::REGISTER => Ok(HostRequest::Register(accelerator_arg(event, &frame.args, 0)?)),
            events::UNREGISTER => Ok(HostRequest::Unregister(accelerator_arg(
                event,
                &frame.args,
                0,
            )?)),
            events::UNREGISTER_ALL => Ok(HostRequest::UnregisterAll),
            events::QUERY => {
                let accelerator = accelerator_arg(event, &frame.args, 0)?;
                let correlation: CorrelationId = string_arg(event, &frame.args, 1)?.parse()?;
                Ok(HostRequest::Query {
                    accelerator,
                    correlation,
                })
            }
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

// ── Host → controller ─────────────────────────────────────────────────────────

/// An event the host emits to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The user pressed the accelerator.
    Fired(Accelerator),
    /// The answer to one `query` call.
    QueryCompleted {
        correlation: CorrelationId,
        registered: bool,
    },
}

impl HostEvent {
    /// Returns the event name.  For query answers this is the per-call channel.
    pub fn event_name(&self) -> String {
        match self {
            HostEvent::Fired(_) => events::FIRED.to_string(),
            HostEvent::QueryCompleted { correlation, .. } => correlation.channel(),
        }
    }

    /// Returns the single payload value the controller-side handler receives.
    pub fn payload(&self) -> Value {
        match self {
            HostEvent::Fired(acc) => Value::String(acc.to_string()),
            HostEvent::QueryCompleted { registered, .. } => Value::Bool(*registered),
        }
    }

    /// Wraps the event in a [`BridgeFrame`].
    pub fn to_frame(&self) -> BridgeFrame {
        BridgeFrame::new(self.event_name(), vec![self.payload()])
    }

    /// Interprets a frame received by the controller.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the event is unknown or the payload has
    /// the wrong type.
    pub fn from_frame(frame: &BridgeFrame) -> Result<Self, ProtocolError> {
        let event = frame.event.as_str();
        if event == events::FIRED {
            return Ok(HostEvent::Fired(accelerator_arg(event, &frame.args, 0)?));
        }
        if let Some(correlation) = CorrelationId::from_channel(event) {
            let registered = match frame.args.first() {
                Some(Value::Bool(b)) => *b,
                Some(_) => {
                    return Err(ProtocolError::InvalidArgument {
                        event: event.to_string(),
                        index: 0,
                        expected: "boolean",
                    })
                }
                None => {
                    return Err(ProtocolError::MissingArgument {
                        event: event.to_string(),
                        index: 0,
                    })
                }
            };
            return Ok(HostEvent::QueryCompleted {
                correlation,
                registered,
            });
        }
        Err(ProtocolError::UnknownEvent(event.to_string()))
    }
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn string_arg<'a>(event: &str, args: &'a [Value], index: usize) -> Result<&'a str, ProtocolError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ProtocolError::InvalidArgument {
            event: event.to_string(),
            index,
            expected: "string",
        }),
        None => Err(ProtocolError::MissingArgument {
            event: event.to_string(),
            index,
        }),
    }
}

fn accelerator_arg(event: &str, args: &[Value], index: usize) -> Result<Accelerator, ProtocolError> {
    Ok(Accelerator::parse(string_arg(event, args, index)?)?)
}
