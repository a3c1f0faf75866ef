//! Socket endpoint construction.
//!
//! The platform accepts a single GET-style upgrade request:
//!
//! ```text
//! <ws_address>/ws?app_id=<percent-encoded>&token=<percent-encoded>
//! ```

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Path of the realtime endpoint, relative to the socket address.
pub const SOCKET_PATH: &str = "/ws";

// ============================================================================
// Functions
// ============================================================================

/// Builds the connection URL for the realtime socket.
///
/// Both `app_id` and `token` are percent-encoded. A trailing `/` on
/// `ws_address` is ignored.
///
/// # Errors
///
/// - [`Error::InvalidUrl`] if the result does not parse as a URL
/// - [`Error::Config`] if the scheme is not `ws` or `wss`
pub fn connection_url(ws_address: &str, app_id: &str, token: &str) -> Result<String> {
    let base = ws_address.trim_end_matches('/');
    let raw = format!(
        "{base}{SOCKET_PATH}?app_id={}&token={}",
        urlencoding::encode(app_id),
        urlencoding::encode(token)
    );

    match Url::parse(&raw)?.scheme() {
        "ws" | "wss" => Ok(raw),
        scheme => Err(Error::config(format!(
            "Unsupported socket scheme '{scheme}', expected ws or wss"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
