//! Auth client collaborator.
//!
//! The platform's REST surface lives outside this crate. The realtime
//! manager needs exactly one thing from it: confirmation that the session's
//! access token is valid, refreshing it first if necessary.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// AuthClient
// ============================================================================

/// Validates credentials before a socket handshake.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use blockv_realtime::{AuthClient, Error, Result};
///
/// struct StaticToken;
///
/// #[async_trait]
/// impl AuthClient for StaticToken {
///     async fn check_token(&self, access_token: &str) -> Result<()> {
///         if access_token.is_empty() {
///             return Err(Error::auth("no access token"));
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Ensures `access_token` is usable.
    ///
    /// Implementations that refresh the token must write the new value to
    /// the session store before returning; the manager re-reads it when
    /// building the connection URL.
    ///
    /// # Errors
    ///
    /// Any error is treated as a transient failure and retried with backoff.
    async fn check_token(&self, access_token: &str) -> Result<()>;
}
