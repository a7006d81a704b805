//! JSON envelope for carrying bridge events over a byte-oriented transport.
//!
//! In-process bridges pass `(event, args)` directly.  Network transports wrap
//! each emission in a [`BridgeFrame`] and send it as one JSON text message:
//!
//! ```json
//! {"event": "register", "args": ["CmdOrCtrl+X"]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::messages::ProtocolError;

/// One named event and its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeFrame {
    /// The event name the receiver routes on.
    pub event: String,
    /// Positional payload.  Absent in JSON means no arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl BridgeFrame {
    /// Creates a frame.
    pub fn new(event: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            event: event.into(),
            args,
        }
    }

    /// Returns the first argument, or `Value::Null` if there is none.
    ///
    /// Event handlers receive a single payload value; this is that value.
    pub fn first_arg(&self) -> Value {
        self.args.first().cloned().unwrap_or(Value::Null)
    }

    /// Serialises the frame to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Json(e.to_string()))
    }

    /// Parses a frame from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] if the text is not a valid frame.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Json(e.to_string()))
    }
}
