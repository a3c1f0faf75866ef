//! BLOCKv realtime - reconnecting WebSocket feed for the BLOCKv platform.
//!
//! This library keeps a single live WebSocket to the platform's realtime
//! endpoint, classifies every inbound frame by its `msg_type`, and
//! republishes it through an in-process event bus. Dropped connections are
//! restored transparently with exponential backoff.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  check_token  ┌──────────────┐
//! │ RealtimeManager│──────────────►│  AuthClient  │  (REST, external)
//! │                │  credentials  ├──────────────┤
//! │                │◄──────────────│ SessionStore │
//! │   EventBus     │               └──────────────┘
//! │   Transport ───┼────── wss://<host>/ws?app_id=..&token=.. ──────►
//! └────────────────┘
//! ```
//!
//! Key design principles:
//!
//! - `connect()` never fails; failures turn into background retries
//! - Credentials are re-read on every attempt, so token rotation is honored
//! - `close()` cancels a pending retry; stale timers never reopen the socket
//! - The manager holds its event bus by composition and delegates to it
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use blockv_realtime::{AuthClient, RealtimeManager, Result, Session, channel};
//!
//! struct Rest;
//!
//! #[async_trait]
//! impl AuthClient for Rest {
//!     async fn check_token(&self, _access_token: &str) -> Result<()> {
//!         // Call the platform's token endpoint here.
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Arc::new(Session::new("my-app-id").with_access_token("token"));
//!     let manager = RealtimeManager::new(session, Arc::new(Rest));
//!
//!     manager.subscribe(channel::STATE_UPDATE, |frame| {
//!         println!("vAtom changed: {frame}");
//!     });
//!
//!     let connected = manager.once(channel::CONNECTED);
//!     manager.connect().await;
//!     connected.await?;
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     manager.close();
//!     Ok(())
//! }
//! ```
//!
//! # Channels
//!
//! | Channel | Payload |
//! |---------|---------|
//! | `raw` | Every decoded frame |
//! | `stateUpdate` | `msg_type` = `state_update` |
//! | `inventory` | `msg_type` = `inventory` |
//! | `activity` | `msg_type` = `my_events` |
//! | `info` | `msg_type` = `info` |
//! | `all` | Every non-empty decoded frame |
//! | `connected` | `null`, after each successful handshake |
//! | `disconnected` | `null`, after the socket closes |
//! | `error` | `{ "message", "recoverable" }` for background failures |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Auth client collaborator trait |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | Named-channel publish/subscribe bus |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Frame decoding and endpoint URL |
//! | [`realtime`] | Reconnecting connection manager |
//! | [`session`] | Session credential store |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Auth client collaborator.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// In-process publish/subscribe.
pub mod events;

/// Type-safe identifiers.
pub mod identifiers;

/// Realtime socket protocol.
///
/// Frame decoding, routing and endpoint construction.
pub mod protocol;

/// Reconnecting realtime feed.
///
/// Use [`RealtimeManager::builder()`] to create a configured manager.
pub mod realtime;

/// Session credentials.
pub mod session;

/// WebSocket transport layer.
///
/// Internal module owning the raw socket and its read loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Collaborators
pub use client::AuthClient;
pub use session::{Session, SessionStore};

// Error types
pub use error::{Error, Result};

// Event types
pub use events::EventBus;
pub use identifiers::ListenerId;

// Protocol types
pub use protocol::{InboundFrame, MessageType, channel};

// Realtime types
pub use realtime::{ConnectionState, RealtimeBuilder, RealtimeManager};
