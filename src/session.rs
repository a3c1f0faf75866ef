//! Session credentials consumed by the realtime manager.
//!
//! The manager never caches credentials: it reads them from the
//! [`SessionStore`] on every connect attempt, so a token refreshed by the
//! auth client (or rotated by the application) is picked up by the next
//! retry.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::RwLock;

// ============================================================================
// SessionStore
// ============================================================================

/// Read access to the current session's credentials.
pub trait SessionStore: Send + Sync {
    /// Current access token.
    fn access_token(&self) -> String;

    /// Application identifier issued by the platform.
    fn app_id(&self) -> String;

    /// Base WebSocket address, e.g. `wss://ws.blockv.io`.
    fn ws_address(&self) -> String;
}

// ============================================================================
// Session
// ============================================================================

/// Default production socket address.
pub const DEFAULT_WS_ADDRESS: &str = "wss://ws.blockv.io";

/// Thread-safe in-memory [`SessionStore`].
///
/// # Example
///
/// ```
/// use blockv_realtime::{Session, SessionStore};
///
/// let session = Session::new("my-app-id");
/// session.set_access_token("initial");
/// assert_eq!(session.access_token(), "initial");
///
/// session.set_access_token("rotated");
/// assert_eq!(session.access_token(), "rotated");
/// ```
pub struct Session {
    app_id: RwLock<String>,
    access_token: RwLock<String>,
    ws_address: RwLock<String>,
}

impl Session {
    /// Creates a session for `app_id` pointed at [`DEFAULT_WS_ADDRESS`]
    /// with an empty access token.
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: RwLock::new(app_id.into()),
            access_token: RwLock::new(String::new()),
            ws_address: RwLock::new(DEFAULT_WS_ADDRESS.to_string()),
        }
    }

    /// Sets the socket address.
    #[must_use]
    pub fn with_ws_address(self, ws_address: impl Into<String>) -> Self {
        *self.ws_address.write() = ws_address.into();
        self
    }

    /// Sets the access token.
    #[must_use]
    pub fn with_access_token(self, access_token: impl Into<String>) -> Self {
        self.set_access_token(access_token);
        self
    }

    /// Replaces the access token.
    pub fn set_access_token(&self, access_token: impl Into<String>) {
        *self.access_token.write() = access_token.into();
    }

    /// Replaces the application identifier.
    pub fn set_app_id(&self, app_id: impl Into<String>) {
        *self.app_id.write() = app_id.into();
    }

    /// Replaces the socket address.
    pub fn set_ws_address(&self, ws_address: impl Into<String>) {
        *self.ws_address.write() = ws_address.into();
    }
}

impl SessionStore for Session {
    fn access_token(&self) -> String {
        self.access_token.read().clone()
    }

    fn app_id(&self) -> String {
        self.app_id.read().clone()
    }

    fn ws_address(&self) -> String {
        self.ws_address.read().clone()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("app_id", &*self.app_id.read())
            .field("ws_address", &*self.ws_address.read())
            .field("has_token", &!self.access_token.read().is_empty())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let session = Session::new("app");
        assert_eq!(session.app_id(), "app");
        assert_eq!(session.access_token(), "");
        assert_eq!(session.ws_address(), DEFAULT_WS_ADDRESS);
    }

    #[test]
    fn test_builder_methods() {
        let session = Session::new("app")
            .with_ws_address("ws://127.0.0.1:9000")
            .with_access_token("tok");
        assert_eq!(session.ws_address(), "ws://127.0.0.1:9000");
        assert_eq!(session.access_token(), "tok");
    }

    #[test]
    fn test_setters() {
        let session = Session::new("app");
        session.set_app_id("other");
        session.set_ws_address("wss://example.test");
        session.set_access_token("t2");
        assert_eq!(session.app_id(), "other");
        assert_eq!(session.ws_address(), "wss://example.test");
        assert_eq!(session.access_token(), "t2");
    }

    #[test]
    fn test_debug_hides_token() {
        let session = Session::new("app").with_access_token("secret");
        let text = format!("{session:?}");
        assert!(!text.contains("secret"));
        assert!(text.contains("has_token: true"));
    }
}
