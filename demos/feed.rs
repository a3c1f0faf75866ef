//! Prints the realtime feed for a session.
//!
//! Usage:
//!
//! ```text
//! BLOCKV_APP_ID=... BLOCKV_ACCESS_TOKEN=... cargo run --example feed -- [--debug]
//! ```
//!
//! `BLOCKV_WS_ADDRESS` overrides the socket address.

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use blockv_realtime::{AuthClient, Error, RealtimeManager, Result, Session, channel};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Accepts any non-empty token.
///
/// A real application would call the platform's token endpoint here and
/// store the refreshed token in the session.
struct PresenceCheck;

#[async_trait]
impl AuthClient for PresenceCheck {
    async fn check_token(&self, access_token: &str) -> Result<()> {
        if access_token.is_empty() {
            return Err(Error::auth("BLOCKV_ACCESS_TOKEN is empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "blockv_realtime=debug"
    } else {
        "blockv_realtime=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(env::args().any(|a| a == "--debug"));

    let app_id = env::var("BLOCKV_APP_ID").context("BLOCKV_APP_ID is not set")?;
    let token = env::var("BLOCKV_ACCESS_TOKEN").context("BLOCKV_ACCESS_TOKEN is not set")?;

    let mut session = Session::new(app_id).with_access_token(token);
    if let Ok(address) = env::var("BLOCKV_WS_ADDRESS") {
        session = session.with_ws_address(address);
    }

    let manager = RealtimeManager::builder()
        .session(Arc::new(session))
        .client(Arc::new(PresenceCheck))
        .max_delay(Duration::from_secs(30))
        .build()?;

    for name in [channel::STATE_UPDATE, channel::INVENTORY, channel::ACTIVITY, channel::INFO] {
        manager.subscribe(name, move |frame| println!("[{name}] {frame}"));
    }
    manager.subscribe(channel::ERROR, |error| eprintln!("[error] {error}"));
    manager.subscribe(channel::CONNECTED, |_| println!("[connected]"));

    manager.connect().await;
    println!("State: {}", manager.state());

    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c().await.ok();

    manager.close();
    Ok(())
}
