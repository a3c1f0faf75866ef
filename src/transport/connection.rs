//! WebSocket client connection and read loop.
//!
//! A [`Transport`] owns one outbound WebSocket. It spawns a tokio task that
//! performs the handshake and then reads frames, reporting everything it
//! observes to a single [`TransportHandler`].
//!
//! # Event Order
//!
//! ```text
//! Open → Message* → Closed      (handshake succeeded)
//! Closed                        (handshake failed or shutdown first)
//! ```
//!
//! `Closed` is always the last event and is delivered exactly once.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Once};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

// ============================================================================
// Types
// ============================================================================

/// Callback receiving every event from a transport.
///
/// Invoked on the transport's own task, in the order events occur.
pub type TransportHandler = Box<dyn Fn(TransportEvent) + Send + Sync>;

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle of a single transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    /// Handshake in progress.
    Connecting = 0,
    /// Handshake complete, frames flowing.
    Open = 1,
    /// Close requested by the owner.
    Closing = 2,
    /// Connection finished. The transport will not reopen.
    Closed = 3,
}

impl ReadyState {
    #[inline]
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed.
    Open,
    /// A text frame arrived.
    Message(String),
    /// The connection ended.
    Closed {
        /// Failure description, `None` for a clean close.
        error: Option<String>,
    },
}

// ============================================================================
// TransportCommand
// ============================================================================

/// Internal commands for the read loop.
enum TransportCommand {
    /// Close the socket and stop.
    Shutdown,
}

// ============================================================================
// Transport
// ============================================================================

/// An outbound WebSocket connection.
///
/// Dropping the transport shuts its task down.
pub struct Transport {
    /// Channel for sending commands to the read loop.
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    /// Current [`ReadyState`] (shared with the read loop).
    ready_state: Arc<AtomicU8>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("ready_state", &self.ready_state())
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Starts connecting to `url`.
    ///
    /// Returns immediately in [`ReadyState::Connecting`]; progress is
    /// reported to `handler`.
    #[must_use]
    pub fn open(url: String, handler: TransportHandler) -> Self {
        install_crypto_provider();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let ready_state = Arc::new(AtomicU8::new(ReadyState::Connecting as u8));

        tokio::spawn(Self::run(
            url,
            command_rx,
            Arc::clone(&ready_state),
            handler,
        ));

        Self {
            command_tx,
            ready_state,
        }
    }

    /// Returns the current ready state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.ready_state.load(Ordering::SeqCst))
    }

    /// Requests a graceful close.
    ///
    /// Calling this more than once, or after the connection ended, is a no-op.
    pub fn close(&self) {
        let _ = self.ready_state.compare_exchange(
            ReadyState::Connecting as u8,
            ReadyState::Closing as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        let _ = self.ready_state.compare_exchange(
            ReadyState::Open as u8,
            ReadyState::Closing as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        let _ = self.command_tx.send(TransportCommand::Shutdown);
    }

    /// Handshake and read loop.
    async fn run(
        url: String,
        mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
        ready_state: Arc<AtomicU8>,
        handler: TransportHandler,
    ) {
        let finish = |error: Option<String>| {
            ready_state.store(ReadyState::Closed as u8, Ordering::SeqCst);
            handler(TransportEvent::Closed { error });
        };

        let mut ws_stream = tokio::select! {
            result = connect_async(url.as_str()) => match result {
                Ok((stream, response)) => {
                    debug!(status = %response.status(), "WebSocket handshake completed");
                    stream
                }
                Err(e) => {
                    warn!(error = %e, "WebSocket handshake failed");
                    finish(Some(e.to_string()));
                    return;
                }
            },

            _ = command_rx.recv() => {
                debug!("Shutdown requested during handshake");
                finish(None);
                return;
            }
        };

        // A close() that raced the handshake wins.
        if ready_state
            .compare_exchange(
                ReadyState::Connecting as u8,
                ReadyState::Open as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            let _ = ws_stream.close(None).await;
            finish(None);
            return;
        }

        handler(TransportEvent::Open);

        let (mut ws_write, mut ws_read) = ws_stream.split();

        let error = loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Text frame received");
                            handler(TransportEvent::Message(text.as_str().to_owned()));
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by remote");
                            break None;
                        }

                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            break Some(e.to_string());
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break None;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Shutdown) | None => {
                            debug!("Shutdown requested");
                            let _ = ws_write.close().await;
                            break None;
                        }
                    }
                }
            }
        };

        finish(error);
        debug!("Read loop terminated");
    }
}

// ============================================================================
// TLS
// ============================================================================

/// Installs `ring` as the process-wide rustls provider for `wss://`.
///
/// Leaves an already-installed provider in place.
fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

// ============================================================================
// Tests
// ============================================================================
