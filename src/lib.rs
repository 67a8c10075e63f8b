//! # Chatlink
//!
//! A resilient realtime chat connection manager.
//!
//! [`ConnectionManager`] keeps one authenticated socket alive: heartbeat probes against
//! idle intermediaries, an inactivity watchdog against half-open connections, and a
//! fixed-delay reconnect after any failure.

#![deny(missing_debug_implementations, missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod subscriber;
pub mod token;
pub mod ws;

mod error;
pub use error::{Error, Result};

pub use api::types::SocketUrl;
pub use config::Config;
pub use subscriber::{MessageSubscriber, StatusSubscriber};
pub use token::{StaticToken, TokenError, TokenSource};
pub use ws::{ChatMessage, ConnectError, ConnectionManager, ConnectionState, SendError};

use snafu::prelude::*;

/// Ask the chat api where the realtime socket lives
pub async fn discover_endpoint(client: &api::Client) -> Result<SocketUrl> {
    log::info!("Getting socket url ...");

    let connection = client
        .socket_connection()
        .await
        .context(error::CallAPIFailed)?;

    log::debug!("Got socket connection {}", connection.connection_id);

    connection
        .url
        .parse()
        .with_context(|_| error::InvalidSocketURL {
            url: &connection.url,
        })
}
