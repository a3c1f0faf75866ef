//! Local WebSocket server for transport and manager tests.

// ============================================================================
// Imports
// ============================================================================

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

// ============================================================================
// Behavior
// ============================================================================

/// What the server does with each accepted connection after sending frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    /// Keep the connection open until the client leaves.
    Hold,
    /// Send a close frame right after the scripted frames.
    CloseAfterFrames,
}

// ============================================================================
// TestServer
// ============================================================================

/// A WebSocket server bound to `127.0.0.1:0`.
///
/// Every accepted connection receives the same scripted frames.
pub(crate) struct TestServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    uris: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Binds and starts accepting in the background.
    pub(crate) async fn start(frames: Vec<String>, behavior: Behavior) -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local addr");
        let accepted = Arc::new(AtomicUsize::new(0));
        let uris = Arc::new(Mutex::new(Vec::new()));

        let accepted_clone = Arc::clone(&accepted);
        let uris_clone = Arc::clone(&uris);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let frames = frames.clone();
                let accepted = Arc::clone(&accepted_clone);
                let uris = Arc::clone(&uris_clone);

                tokio::spawn(async move {
                    let record = |request: &Request, response: Response| {
                        uris.lock().push(request.uri().to_string());
                        Ok::<Response, ErrorResponse>(response)
                    };
                    let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, record).await
                    else {
                        return;
                    };
                    accepted.fetch_add(1, Ordering::SeqCst);

                    for frame in frames {
                        if ws.send(Message::Text(frame.into())).await.is_err() {
                            return;
                        }
                    }

                    if behavior == Behavior::CloseAfterFrames {
                        let _ = ws.close(None).await;
                    }
                    while let Some(Ok(_)) = ws.next().await {}
                });
            }
        });

        Self {
            addr,
            accepted,
            uris,
        }
    }

    /// Base socket address, as a session store would hold it.
    pub(crate) fn ws_address(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of completed WebSocket handshakes.
    pub(crate) fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Request URIs of every handshake, in order.
    pub(crate) fn uris(&self) -> Vec<String> {
        self.uris.lock().clone()
    }
}

/// Returns a localhost port with nothing listening on it.
pub(crate) async fn unused_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind should succeed");
    listener.local_addr().expect("local addr").port()
}
