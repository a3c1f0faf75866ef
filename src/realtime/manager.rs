//! Reconnecting realtime connection manager.
//!
//! The [`RealtimeManager`] owns at most one [`Transport`] at a time. It
//! validates credentials through the [`AuthClient`], opens the socket,
//! republishes every inbound frame on its [`EventBus`], and schedules a
//! reconnect with exponential backoff whenever the socket closes.
//!
//! # Reconnect Loop
//!
//! ```text
//! connect() ─► check_token ─► Transport::open ─► Open ─► handle_connected (backoff reset)
//!    ▲              │ err                          │
//!    │              ▼                              ▼ Closed
//!    └── timer ◄── retry_connection ◄──────── handle_close
//! ```
//!
//! [`close`](RealtimeManager::close) aborts the pending retry task and drops
//! the transport. Events from a dropped transport are ignored.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::client::AuthClient;
use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::identifiers::ListenerId;
use crate::protocol::{InboundFrame, channel, connection_url};
use crate::session::SessionStore;
use crate::transport::{ReadyState, Transport, TransportEvent, TransportHandler};

use super::backoff::Backoff;
use super::builder::RealtimeBuilder;
use super::state::ConnectionState;

// ============================================================================
// Types
// ============================================================================

/// A scheduled reconnect.
struct PendingRetry {
    /// Sequence number, unique per scheduling call.
    seq: u64,
    /// Retries scheduled since the last successful open.
    attempt: u32,
    /// Delay this retry waits before firing.
    delay: Duration,
    /// Timer task; aborted by `close()` or a newer schedule.
    task: JoinHandle<()>,
}

/// Mutable connection bookkeeping.
struct ManagerState {
    /// Current transport, possibly already closed.
    transport: Option<Transport>,
    /// Incremented for every transport opened; tags its events.
    generation: u64,
    /// Caller intent. Set by `connect()`, cleared only by `close()`.
    logically_open: bool,
    /// Credential check in flight.
    connecting: bool,
    /// Retry delay progression.
    backoff: Backoff,
    /// Retries scheduled since the last successful open.
    attempt: u32,
    /// Source of [`PendingRetry::seq`].
    retry_seq: u64,
    /// Scheduled reconnect, if any.
    pending_retry: Option<PendingRetry>,
}

/// Internal shared state for the manager.
pub(crate) struct ManagerInner {
    /// Credential source, read on every connect.
    session: Arc<dyn SessionStore>,
    /// Token validation collaborator.
    client: Arc<dyn AuthClient>,
    /// Outbound event distribution.
    events: EventBus<Value>,
    /// Connection bookkeeping.
    state: Mutex<ManagerState>,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        if let Some(retry) = self.state.get_mut().pending_retry.take() {
            retry.task.abort();
        }
    }
}

// ============================================================================
// RealtimeManager
// ============================================================================

/// Reconnecting WebSocket feed for the BLOCKv platform.
///
/// Cloning is cheap; all clones share one connection.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use blockv_realtime::{AuthClient, RealtimeManager, Session, channel};
///
/// # async fn example(client: Arc<dyn AuthClient>) {
/// let session = Arc::new(Session::new("my-app-id").with_access_token("token"));
/// let manager = RealtimeManager::new(session, client);
///
/// manager.subscribe(channel::INVENTORY, |frame| {
///     println!("inventory changed: {frame}");
/// });
///
/// manager.connect().await;
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeManager {
    /// Shared inner state.
    pub(crate) inner: Arc<ManagerInner>,
}

// ============================================================================
// RealtimeManager - Display
// ============================================================================

impl fmt::Debug for RealtimeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeManager")
            .field("state", &self.state())
            .field("retry_delay", &self.retry_delay())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RealtimeManager - Constructor
// ============================================================================

impl RealtimeManager {
    /// Creates a manager with the default retry delays (1s doubling to 8s).
    #[must_use]
    pub fn new(session: Arc<dyn SessionStore>, client: Arc<dyn AuthClient>) -> Self {
        Self::from_parts(session, client, Backoff::default())
    }

    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> RealtimeBuilder {
        RealtimeBuilder::new()
    }

    pub(crate) fn from_parts(
        session: Arc<dyn SessionStore>,
        client: Arc<dyn AuthClient>,
        backoff: Backoff,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                session,
                client,
                events: EventBus::new(),
                state: Mutex::new(ManagerState {
                    transport: None,
                    generation: 0,
                    logically_open: false,
                    connecting: false,
                    backoff,
                    attempt: 0,
                    retry_seq: 0,
                    pending_retry: None,
                }),
            }),
        }
    }
}

// ============================================================================
// RealtimeManager - Public API
// ============================================================================

impl RealtimeManager {
    /// Connects the socket, or does nothing if it is already open or
    /// connecting.
    ///
    /// Never fails. Credential and network failures are reported on
    /// [`channel::ERROR`] and retried in the background; wait for
    /// [`channel::CONNECTED`] or inspect [`state`](Self::state) to learn when
    /// frames start flowing.
    pub async fn connect(&self) -> Self {
        {
            let mut state = self.inner.state.lock();
            // Recorded even when skipped; an in-flight attempt reads it.
            state.logically_open = true;

            let active = state
                .transport
                .as_ref()
                .is_some_and(|transport| transport.ready_state() != ReadyState::Closed);

            if state.connecting || active {
                trace!("Connect skipped, socket already active");
                return self.clone();
            }

            state.connecting = true;
        }

        if let Err(e) = self.open_transport().await {
            warn!(error = %e, "Connect attempt failed");
            self.inner.state.lock().connecting = false;
            self.emit_error(&e);
            self.retry_connection();
        }

        self.clone()
    }

    /// Closes the socket and stops reconnecting until the next
    /// [`connect`](Self::connect).
    ///
    /// Cancels a pending retry. Idempotent.
    pub fn close(&self) {
        let (transport, retry) = {
            let mut state = self.inner.state.lock();
            state.logically_open = false;
            (state.transport.take(), state.pending_retry.take())
        };

        if let Some(retry) = retry {
            retry.task.abort();
            debug!(attempt = retry.attempt, "Pending retry cancelled");
        }

        if let Some(transport) = transport {
            transport.close();
            info!("Realtime socket closed");
        }
    }

    /// Returns where the manager is in its connect/retry cycle.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        let state = self.inner.state.lock();

        if let Some(retry) = &state.pending_retry {
            return ConnectionState::Retrying {
                attempt: retry.attempt,
                delay: retry.delay,
            };
        }
        if state.connecting {
            return ConnectionState::Connecting;
        }

        match state.transport.as_ref().map(Transport::ready_state) {
            Some(ReadyState::Connecting) => ConnectionState::Connecting,
            Some(ReadyState::Open) => ConnectionState::Open,
            Some(ReadyState::Closing | ReadyState::Closed) | None if state.logically_open => {
                ConnectionState::Connecting
            }
            Some(ReadyState::Closing | ReadyState::Closed) | None => ConnectionState::Idle,
        }
    }

    /// Delay the next scheduled retry would wait.
    #[inline]
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.inner.state.lock().backoff.current()
    }
}

// ============================================================================
// RealtimeManager - Events
// ============================================================================

impl RealtimeManager {
    /// The bus every frame and lifecycle event is published on.
    #[inline]
    #[must_use]
    pub fn events(&self) -> &EventBus<Value> {
        &self.inner.events
    }

    /// Registers a persistent listener. See [`EventBus::subscribe`].
    pub fn subscribe<F>(&self, channel: &str, callback: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(channel, callback)
    }

    /// Waits for the next event on `channel`. See [`EventBus::once`].
    pub fn once(&self, channel: &str) -> impl Future<Output = Result<Value>> + Send + use<> {
        self.inner.events.once(channel)
    }

    /// Removes a listener. See [`EventBus::unsubscribe`].
    pub fn unsubscribe(&self, channel: &str, id: ListenerId) -> bool {
        self.inner.events.unsubscribe(channel, id)
    }
}

// ============================================================================
// RealtimeManager - Connection Lifecycle
// ============================================================================

impl RealtimeManager {
    /// Validates the token and opens a transport.
    async fn open_transport(&self) -> Result<()> {
        let session = &self.inner.session;

        self.inner.client.check_token(&session.access_token()).await?;

        // The check may have refreshed the token.
        let url = connection_url(
            &session.ws_address(),
            &session.app_id(),
            &session.access_token(),
        )?;

        let mut state = self.inner.state.lock();
        state.connecting = false;

        if !state.logically_open {
            debug!("Connect cancelled while validating credentials");
            return Ok(());
        }

        if let Some(retry) = state.pending_retry.take() {
            retry.task.abort();
            debug!(attempt = retry.attempt, "Pending retry superseded");
        }

        state.generation += 1;
        let generation = state.generation;
        state.transport = Some(Transport::open(url, self.transport_handler(generation)));

        info!(generation, "Opening realtime socket");
        Ok(())
    }

    /// Routes events of the transport tagged `generation` back to `self`.
    fn transport_handler(&self, generation: u64) -> TransportHandler {
        let weak = Arc::downgrade(&self.inner);

        Box::new(move |event: TransportEvent| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let manager = RealtimeManager { inner };

            if !manager.is_current(generation) {
                trace!(generation, "Ignoring event from stale transport");
                return;
            }

            match event {
                TransportEvent::Open => manager.handle_connected(),
                TransportEvent::Message(text) => manager.handle_message(&text),
                TransportEvent::Closed { error } => {
                    if let Some(error) = error {
                        manager.emit_error(&Error::connection(error));
                    }
                    manager.handle_close();
                }
            }
        })
    }

    /// Returns `true` if `generation` tags the transport currently held.
    fn is_current(&self, generation: u64) -> bool {
        let state = self.inner.state.lock();
        state.transport.is_some() && state.generation == generation
    }

    /// Decodes a text frame and republishes it.
    ///
    /// The parsed payload goes to [`channel::RAW`], to the semantic channel
    /// of its `msg_type` if it has one, and to [`channel::ALL`] if it is
    /// non-empty. A frame that is not JSON is dropped and reported on
    /// [`channel::ERROR`].
    pub(crate) fn handle_message(&self, text: &str) {
        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, len = text.len(), "Dropping malformed frame");
                self.emit_error(&e);
                return;
            }
        };

        trace!(message_type = ?frame.message_type, "Frame received");

        let events = &self.inner.events;
        events.emit(channel::RAW, &frame.payload);

        if let Some(semantic) = frame.channel() {
            events.emit(semantic, &frame.payload);
        }

        if frame.is_non_empty() {
            events.emit(channel::ALL, &frame.payload);
        }
    }

    /// Resets the backoff and announces the open socket.
    pub(crate) fn handle_connected(&self) {
        {
            let mut state = self.inner.state.lock();
            state.backoff.reset();
            state.attempt = 0;
        }

        info!("Realtime socket connected");
        self.inner.events.emit(channel::CONNECTED, &Value::Null);
    }

    /// Announces the closed socket and schedules a reconnect.
    pub(crate) fn handle_close(&self) {
        debug!("Realtime socket closed by transport");
        self.inner.events.emit(channel::DISCONNECTED, &Value::Null);
        self.retry_connection();
    }

    /// Schedules one reconnect after the current delay, then doubles it.
    ///
    /// Replaces any retry already pending. Does nothing after `close()`.
    pub(crate) fn retry_connection(&self) {
        let mut state = self.inner.state.lock();

        if !state.logically_open {
            debug!("Retry suppressed, manager closed");
            return;
        }

        let delay = state.backoff.next_delay();
        state.attempt = state.attempt.saturating_add(1);
        state.retry_seq += 1;
        let attempt = state.attempt;
        let seq = state.retry_seq;

        if let Some(previous) = state.pending_retry.take() {
            previous.task.abort();
        }

        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let manager = RealtimeManager { inner };

            let wanted = {
                let mut state = manager.inner.state.lock();
                if state.pending_retry.as_ref().map(|retry| retry.seq) != Some(seq) {
                    return;
                }
                state.pending_retry = None;

                state.logically_open
                    && state
                        .transport
                        .as_ref()
                        .is_none_or(|transport| transport.ready_state() == ReadyState::Closed)
            };

            if wanted {
                debug!(attempt, "Retrying realtime connection");
                manager.connect().await;
            }
        });

        state.pending_retry = Some(PendingRetry {
            seq,
            attempt,
            delay,
            task,
        });

        info!(
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Reconnect scheduled"
        );
    }

    /// Publishes a background failure on [`channel::ERROR`].
    fn emit_error(&self, error: &Error) {
        self.inner.events.emit(
            channel::ERROR,
            &json!({
                "message": error.to_string(),
                "recoverable": error.is_recoverable(),
            }),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
