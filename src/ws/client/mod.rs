mod inner;

pub use inner::{ConnectError, ConnectionState};

use std::sync::Arc;

use snafu::prelude::*;
use tokio::sync::{mpsc, oneshot, watch};

use super::{
    message::{ChatMessage, EncodeError, Outbound},
    transport::{Connector, WebsocketConnector},
};
use crate::{
    config::Config,
    subscriber::{MessageSubscriber, StatusSubscriber},
    token::TokenSource,
};
use inner::{Command, Driver, Shared};

/// Error when send a message
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum SendError {
    /// connection is not in connected state
    #[snafu(display("connection is {state}, not connected"))]
    NotConnected {
        /// state when send was called
        state: ConnectionState,
    },

    /// encode message failed
    #[snafu(display("encode message failed: {source}"))]
    Encode {
        /// source error
        #[snafu(source(from(EncodeError, Arc::new)))]
        source: Arc<EncodeError>,
    },

    /// connection driver is gone
    #[snafu(display("connection manager stopped"))]
    ManagerStopped,
}

/// Resilient chat connection manager.
///
/// It fetches a credential, opens the socket, keeps it alive with heartbeat probes,
/// force closes it after too long silence, and reconnects after any failure until
/// [`disconnect`](Self::disconnect) is called. All work happens on one background task
/// spawned on the current tokio runtime, this type is only a handle to it.
///
/// Dropping the manager disconnects.
#[derive(Debug)]
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    send_error: Arc<watch::Sender<Option<SendError>>>,
}

impl ConnectionManager {
    /// Create a manager using the given transport connector
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new<T, C>(config: Config, tokens: T, connector: C) -> Self
    where
        T: TokenSource,
        C: Connector,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (send_error, _) = watch::channel(None);
        let send_error = Arc::new(send_error);

        Driver::new(
            config,
            tokens,
            connector,
            Shared {
                commands: commands_rx,
                state: state_tx,
                send_error: send_error.clone(),
            },
        )
        .start();

        Self {
            commands: commands_tx,
            state: state_rx,
            send_error,
        }
    }

    /// Create a manager over websocket
    pub fn websocket<T: TokenSource>(config: Config, tokens: T) -> Self {
        Self::new(config, tokens, WebsocketConnector)
    }

    /// Start connecting, resolves when the attempt finished.
    ///
    /// A failed attempt has already scheduled its reconnect when the error is returned.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let (tx, rx) = oneshot::channel();

        self.commands
            .send(Command::Connect(tx))
            .map_err(|_| ConnectError::ManagerStopped)?;

        rx.await.map_err(|_| ConnectError::ManagerStopped)?
    }

    /// Close the connection, cancel every timer and stop reconnecting
    pub async fn disconnect(&self) {
        let (tx, rx) = oneshot::channel();

        if self.commands.send(Command::Disconnect(tx)).is_err() {
            log::debug!("Connection driver already stopped");
            return;
        }

        let _ = rx.await;
    }

    /// Send a message, false if not connected.
    ///
    /// Failure is advisory, call [`reconnect`](Self::reconnect) to ask for recovery.
    pub fn send(&self, message: &ChatMessage) -> bool {
        self.try_send(message).is_ok()
    }

    /// Send a message, reporting why it can't be sent
    pub fn try_send(&self, message: &ChatMessage) -> Result<(), SendError> {
        let result = self.write(message);

        if let Err(ref err) = result {
            log::debug!("Send message failed: {}", err);
            self.send_error.send_replace(Some(err.clone()));
        }

        result
    }

    fn write(&self, message: &ChatMessage) -> Result<(), SendError> {
        let state = self.state();
        ensure!(
            state == ConnectionState::Connected,
            error::NotConnected { state }
        );

        let frame = Outbound::Message(message)
            .encode()
            .context(error::Encode)?;

        self.commands
            .send(Command::Send(frame))
            .map_err(|_| error::ManagerStopped.build())
    }

    /// Ask for a reconnect after the configured delay.
    ///
    /// Ignored while connected, connecting or disconnected, use [`connect`](Self::connect) to
    /// leave disconnected state.
    pub fn reconnect(&self) {
        let _ = self.commands.send(Command::Reconnect);
    }

    /// Register the message subscriber, replacing the former one
    pub fn on_message<S: MessageSubscriber>(&self, subscriber: S) {
        let _ = self.commands.send(Command::OnMessage(Box::new(subscriber)));
    }

    /// Register the status subscriber, replacing the former one
    pub fn on_status_change<S: StatusSubscriber>(&self, subscriber: S) {
        let _ = self
            .commands
            .send(Command::OnStatusChange(Box::new(subscriber)));
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Last send failure, cleared when connected again
    pub fn last_send_error(&self) -> Option<SendError> {
        self.send_error.borrow().clone()
    }
}
