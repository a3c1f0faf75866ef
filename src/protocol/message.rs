//! Inbound frame decoding and channel routing.
//!
//! Every frame pushed by the platform is a JSON object carrying a
//! `msg_type` discriminator:
//!
//! ```json
//! {
//!   "msg_type": "state_update",
//!   "payload": { ... }
//! }
//! ```
//!
//! # Routing
//!
//! | `msg_type` | Channel |
//! |------------|---------|
//! | `state_update` | `stateUpdate` |
//! | `inventory` | `inventory` |
//! | `my_events` | `activity` |
//! | `info` | `info` |
//! | anything else | none (only `raw` and `all`) |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Channel Names
// ============================================================================

/// Channel names the realtime manager publishes on.
pub mod channel {
    /// Every decoded frame, verbatim.
    pub const RAW: &str = "raw";
    /// Frames with `msg_type` = `state_update`.
    pub const STATE_UPDATE: &str = "stateUpdate";
    /// Frames with `msg_type` = `inventory`.
    pub const INVENTORY: &str = "inventory";
    /// Frames with `msg_type` = `my_events`.
    pub const ACTIVITY: &str = "activity";
    /// Frames with `msg_type` = `info`.
    pub const INFO: &str = "info";
    /// Every decoded frame with a non-empty payload.
    pub const ALL: &str = "all";
    /// The socket finished its handshake.
    pub const CONNECTED: &str = "connected";
    /// The socket closed; a retry has been scheduled.
    pub const DISCONNECTED: &str = "disconnected";
    /// A background failure: credentials, transport or frame decoding.
    pub const ERROR: &str = "error";
}

// ============================================================================
// MessageType
// ============================================================================

/// Value of the `msg_type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    /// `state_update`: a vAtom's state changed.
    StateUpdate,
    /// `inventory`: a vAtom entered or left the user's inventory.
    Inventory,
    /// `my_events`: activity feed entry.
    MyEvents,
    /// `info`: server information.
    Info,
    /// Any type this client does not route to a dedicated channel.
    Other(String),
}

impl MessageType {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::StateUpdate => "state_update",
            Self::Inventory => "inventory",
            Self::MyEvents => "my_events",
            Self::Info => "info",
            Self::Other(name) => name,
        }
    }

    /// Returns the semantic channel for this type, if it has one.
    #[inline]
    #[must_use]
    pub fn channel(&self) -> Option<&'static str> {
        match self {
            Self::StateUpdate => Some(channel::STATE_UPDATE),
            Self::Inventory => Some(channel::INVENTORY),
            Self::MyEvents => Some(channel::ACTIVITY),
            Self::Info => Some(channel::INFO),
            Self::Other(_) => None,
        }
    }
}

impl From<&str> for MessageType {
    fn from(name: &str) -> Self {
        match name {
            "state_update" => Self::StateUpdate,
            "inventory" => Self::Inventory,
            "my_events" => Self::MyEvents,
            "info" => Self::Info,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for MessageType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<MessageType> for String {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// InboundFrame
// ============================================================================

/// A decoded inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    /// The parsed JSON, republished verbatim.
    pub payload: Value,

    /// The `msg_type` discriminator, if present and a string.
    pub message_type: Option<MessageType>,
}

impl InboundFrame {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the frame is not valid JSON.
    pub fn parse(text: &str) -> Result<Self> {
        let payload: Value = serde_json::from_str(text)
            .map_err(|e| Error::protocol(format!("Malformed frame: {e}")))?;

        let message_type = payload
            .get("msg_type")
            .and_then(Value::as_str)
            .map(MessageType::from);

        Ok(Self {
            payload,
            message_type,
        })
    }

    /// Returns the semantic channel this frame is routed to, if any.
    #[inline]
    #[must_use]
    pub fn channel(&self) -> Option<&'static str> {
        self.message_type.as_ref().and_then(MessageType::channel)
    }

    /// Returns `true` if the frame should be published on [`channel::ALL`].
    #[inline]
    #[must_use]
    pub fn is_non_empty(&self) -> bool {
        is_non_empty(&self.payload)
    }
}

/// Returns `false` for `null`, `{}`, `[]` and `""`.
#[must_use]
pub fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

// ============================================================================
// Tests
// ============================================================================
