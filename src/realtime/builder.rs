//! Builder pattern for manager configuration.
//!
//! Provides a fluent API for configuring and creating [`RealtimeManager`]
//! instances.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use blockv_realtime::{AuthClient, RealtimeManager, Session};
//!
//! # fn example(client: Arc<dyn AuthClient>) -> blockv_realtime::Result<()> {
//! let manager = RealtimeManager::builder()
//!     .session(Arc::new(Session::new("my-app-id")))
//!     .client(client)
//!     .initial_delay(Duration::from_millis(500))
//!     .max_delay(Duration::from_secs(30))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::client::AuthClient;
use crate::error::{Error, Result};
use crate::session::SessionStore;

use super::backoff::{Backoff, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY};
use super::manager::RealtimeManager;

// ============================================================================
// RealtimeBuilder
// ============================================================================

/// Builder for configuring a [`RealtimeManager`].
///
/// Use [`RealtimeManager::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct RealtimeBuilder {
    /// Credential source.
    session: Option<Arc<dyn SessionStore>>,
    /// Token validation collaborator.
    client: Option<Arc<dyn AuthClient>>,
    /// First retry delay.
    initial_delay: Option<Duration>,
    /// Retry delay cap.
    max_delay: Option<Duration>,
}

impl fmt::Debug for RealtimeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeBuilder")
            .field("session", &self.session.is_some())
            .field("client", &self.client.is_some())
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

// ============================================================================
// RealtimeBuilder Implementation
// ============================================================================

impl RealtimeBuilder {
    /// Creates a builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session store credentials are read from.
    #[inline]
    #[must_use]
    pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Sets the auth client used to validate tokens before each handshake.
    #[inline]
    #[must_use]
    pub fn client(mut self, client: Arc<dyn AuthClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the first retry delay. Defaults to 1 second.
    #[inline]
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Sets the retry delay cap. Defaults to 8 seconds.
    #[inline]
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Builds the manager with validation.
    ///
    /// The manager starts [`Idle`](crate::ConnectionState::Idle); call
    /// [`connect`](RealtimeManager::connect) to open the socket.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the session or client is not set
    /// - [`Error::Config`] if the initial delay is zero
    /// - [`Error::Config`] if the maximum delay is below the initial delay
    pub fn build(self) -> Result<RealtimeManager> {
        let backoff = self.validate_backoff()?;

        let session = self.session.ok_or_else(|| {
            Error::config(
                "Session store is required. Use .session() to set it.\n\
                 Example: RealtimeManager::builder().session(Arc::new(Session::new(\"app-id\")))",
            )
        })?;

        let client = self.client.ok_or_else(|| {
            Error::config(
                "Auth client is required. Use .client() to set it.\n\
                 It validates the access token before every handshake.",
            )
        })?;

        Ok(RealtimeManager::from_parts(session, client, backoff))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl RealtimeBuilder {
    /// Validates the retry delay configuration.
    fn validate_backoff(&self) -> Result<Backoff> {
        let initial = self.initial_delay.unwrap_or(DEFAULT_INITIAL_DELAY);
        let max = self.max_delay.unwrap_or(DEFAULT_MAX_DELAY.max(initial));

        if initial.is_zero() {
            return Err(Error::config("Initial retry delay must be greater than zero"));
        }

        if max < initial {
            return Err(Error::config(format!(
                "Maximum retry delay ({}ms) is below the initial delay ({}ms)",
                max.as_millis(),
                initial.as_millis()
            )));
        }

        Ok(Backoff::new(initial, max))
    }
}

// ============================================================================
// Tests
// ============================================================================
