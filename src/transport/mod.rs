//! WebSocket transport layer.
//!
//! This module owns the raw socket to the platform's realtime endpoint.
//! It knows nothing about credentials, routing or retries; the
//! [`RealtimeManager`](crate::RealtimeManager) layers those on top.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                            ┌─────────────────┐
//! │ RealtimeManager  │                            │  BLOCKv         │
//! │                  │        WebSocket           │  realtime       │
//! │  Transport  ─────┼───────────────────────────►│  endpoint       │
//! │  (read loop)  ◄──┼──── JSON text frames ──────│  /ws            │
//! └──────────────────┘                            └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket client connection and read loop |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket client connection and read loop.
pub mod connection;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{ReadyState, Transport, TransportEvent, TransportHandler};
