//! Realtime socket protocol.
//!
//! The platform pushes JSON text frames over a single WebSocket. This
//! client never sends frames of its own.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `endpoint` | Connection URL construction |
//! | `message` | Inbound frame decoding and channel names |

// ============================================================================
// Submodules
// ============================================================================

/// Connection URL construction.
pub mod endpoint;

/// Inbound frame decoding and channel names.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use endpoint::{SOCKET_PATH, connection_url};
pub use message::{InboundFrame, MessageType, channel, is_non_empty};
