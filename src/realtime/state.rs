//! Caller-visible connection state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Serialize;

// ============================================================================
// ConnectionState
// ============================================================================

/// Where the manager is in its connect/retry cycle.
///
/// ```text
/// Idle ──connect()──► Connecting ──open──► Open
///                         ▲                  │
///                         │               close event
///                         │                  ▼
///                         └──── timer ─── Retrying
///
/// close() from any state ──► Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport and no pending retry.
    Idle,
    /// Validating credentials or performing the handshake.
    Connecting,
    /// Frames are flowing.
    Open,
    /// Waiting to reconnect.
    Retrying {
        /// Retries scheduled since the last successful open.
        attempt: u32,
        /// Delay before this retry fires.
        #[serde(rename = "delay_ms", serialize_with = "serialize_millis")]
        delay: Duration,
    },
}

impl ConnectionState {
    /// Returns `true` in [`ConnectionState::Open`].
    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Retrying { attempt, delay } => {
                write!(f, "retrying (attempt {attempt}, in {}ms)", delay.as_millis())
            }
        }
    }
}

fn serialize_millis<S>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// Tests
// ============================================================================
