//! Reconnecting realtime feed.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RealtimeManager`] | Owns the socket, routes frames, reconnects |
//! | [`RealtimeBuilder`] | Fluent configuration builder |
//! | [`ConnectionState`] | Caller-visible connect/retry state |
//! | [`Backoff`] | Doubling retry delay with a cap |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use blockv_realtime::{AuthClient, RealtimeManager, Session, channel};
//!
//! # async fn example(client: Arc<dyn AuthClient>) -> blockv_realtime::Result<()> {
//! let manager = RealtimeManager::builder()
//!     .session(Arc::new(Session::new("my-app-id").with_access_token("token")))
//!     .client(client)
//!     .build()?;
//!
//! let connected = manager.once(channel::CONNECTED);
//! manager.connect().await;
//! connected.await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Exponential retry delay.
pub mod backoff;

/// Fluent builder pattern for manager configuration.
pub mod builder;

/// Connection manager implementation.
pub mod manager;

/// Caller-visible connection state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::{Backoff, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY};
pub use builder::RealtimeBuilder;
pub use manager::RealtimeManager;
pub use state::ConnectionState;
