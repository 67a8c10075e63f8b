mod attempt;
mod heartbeat;
mod reconnect;
mod state;
mod watchdog;

pub use attempt::ConnectError;
pub use state::ConnectionState;

use std::{fmt::Display, sync::Arc};

use futures_util::SinkExt;
use snafu::prelude::*;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::Instant,
};

use attempt::{Attempt, Progress};
use heartbeat::Heartbeat;
use reconnect::ReconnectScheduler;
use watchdog::Watchdog;

use super::SendError;
use crate::{
    config::Config,
    subscriber::{MessageSubscriber, StatusSubscriber, Subscriptions},
    token::TokenSource,
    ws::{
        message::{Inbound, Outbound},
        transport::{Connector, FrameSink, FrameStream, TransportError},
    },
};

/// Request from a [`ConnectionManager`](super::ConnectionManager) handle
pub(crate) enum Command {
    Connect(oneshot::Sender<Result<(), ConnectError>>),
    Send(String),
    Reconnect,
    Disconnect(oneshot::Sender<()>),
    OnMessage(Box<dyn MessageSubscriber>),
    OnStatusChange(Box<dyn StatusSubscriber>),
}

impl Command {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Connect(_) => "Connect",
            Self::Send(_) => "Send",
            Self::Reconnect => "Reconnect",
            Self::Disconnect(_) => "Disconnect",
            Self::OnMessage(_) => "OnMessage",
            Self::OnStatusChange(_) => "OnStatusChange",
        }
    }
}

/// Why an open (or opening) connection was torn down
#[derive(Debug)]
enum LostReason {
    PeerClosed,
    Transport(TransportError),
    WriteFailed(TransportError),
    HeartbeatFailed(TransportError),
    Inactive,
    OpenFailed,
    ConnectTimeout,
}

impl Display for LostReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeerClosed => f.write_str("closed by peer"),
            Self::Transport(err) => write!(f, "transport broken: {}", err),
            Self::WriteFailed(err) => write!(f, "write message failed: {}", err),
            Self::HeartbeatFailed(err) => write!(f, "write heartbeat failed: {}", err),
            Self::Inactive => f.write_str("no inbound activity"),
            Self::OpenFailed => f.write_str("transport handshake failed"),
            Self::ConnectTimeout => f.write_str("transport handshake timeout"),
        }
    }
}

/// Channels shared between the driver and its handle
pub(crate) struct Shared {
    pub commands: mpsc::UnboundedReceiver<Command>,
    pub state: watch::Sender<ConnectionState>,
    pub send_error: Arc<watch::Sender<Option<SendError>>>,
}

/// The single actor owning the transport, timers and subscriptions.
///
/// Every state mutation happens on this task, so heartbeat, watchdog, reconnect timer,
/// inbound frames and caller commands never race each other.
pub(crate) struct Driver<T, C> {
    config: Config,
    tokens: Arc<T>,
    connector: Arc<C>,
    shared: Shared,
    subscriptions: Subscriptions,

    attempt: Option<Attempt>,
    waiters: Vec<oneshot::Sender<Result<(), ConnectError>>>,

    sink: Option<FrameSink>,
    stream: Option<FrameStream>,
    heartbeat: Option<Heartbeat>,
    watchdog: Option<Watchdog>,
    scheduler: ReconnectScheduler,

    // last value given to status subscriber
    reported: bool,
}

impl<T, C> Driver<T, C>
where
    T: TokenSource,
    C: Connector,
{
    pub fn new(config: Config, tokens: T, connector: C, shared: Shared) -> Self {
        let scheduler = ReconnectScheduler::new(config.reconnect_delay);

        Self {
            config,
            tokens: Arc::new(tokens),
            connector: Arc::new(connector),
            shared,
            subscriptions: Subscriptions::default(),
            attempt: None,
            waiters: Vec::new(),
            sink: None,
            stream: None,
            heartbeat: None,
            watchdog: None,
            scheduler,
            reported: false,
        }
    }

    pub fn start(self) {
        tokio::spawn(self.run());
    }

    async fn run(mut self) {
        log::debug!("Connection driver start, endpoint {}", self.config.endpoint);

        loop {
            tokio::select! {
                biased;

                command = self.shared.commands.recv() => {
                    match command {
                        Some(command) => self.handle(command).await,
                        None => {
                            log::debug!("All manager handles dropped, stop");
                            self.teardown().await;
                            break;
                        }
                    }
                }

                progress = attempt::progress(&mut self.attempt) => {
                    self.on_progress(progress);
                }

                frame = next_frame(&mut self.stream) => {
                    self.on_frame(frame);
                }

                _ = watchdog::tick(&mut self.watchdog) => {
                    self.on_watchdog().await;
                }

                _ = heartbeat::tick(&mut self.heartbeat) => {
                    self.on_heartbeat().await;
                }

                _ = reconnect::due(self.scheduler.deadline()) => {
                    self.on_reconnect_due();
                }
            }
        }

        log::debug!("Connection driver stopped");
    }

    fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    fn set_state(&mut self, state: ConnectionState) {
        let old = self.shared.state.send_replace(state);
        if old != state {
            log::debug!("Move to {} state", state);
        }
    }

    /// Status subscriber only sees edges, never the same value twice in a row
    fn report(&mut self, connected: bool) {
        if self.reported == connected {
            return;
        }
        self.reported = connected;
        self.subscriptions.notify(connected);
    }

    fn finish_attempt(&mut self, result: Result<(), ConnectError>) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }
    }

    async fn handle(&mut self, command: Command) {
        log::trace!("Handle {} command", command.type_name());

        match command {
            Command::Connect(done) => {
                if self.attempt.is_some() {
                    log::debug!("Connect attempt already in progress, wait it");
                    self.waiters.push(done);
                    return;
                }

                if self.state() == ConnectionState::Connected {
                    let _ = done.send(Ok(()));
                    return;
                }

                if self.scheduler.cancel() {
                    log::debug!("Explicit connect supersedes pending reconnect");
                }

                self.waiters.push(done);
                self.start_attempt();
            }
            Command::Send(frame) => {
                let state = self.state();
                if state != ConnectionState::Connected {
                    log::warn!("Drop outbound frame, connection is {}", state);
                    self.shared
                        .send_error
                        .send_replace(Some(SendError::NotConnected { state }));
                    return;
                }

                match self.write(frame).await {
                    Ok(()) => {
                        if let Some(watchdog) = self.watchdog.as_mut() {
                            watchdog.touch();
                        }
                    }
                    Err(err) => self.recover(LostReason::WriteFailed(err)),
                }
            }
            Command::Reconnect => {
                // only an explicit connect leaves disconnected state
                let state = self.state();
                if self.attempt.is_some()
                    || matches!(
                        state,
                        ConnectionState::Connected | ConnectionState::Disconnected
                    )
                {
                    log::debug!("Ignore reconnect signal, connection is {}", state);
                    return;
                }

                self.set_state(ConnectionState::Reconnecting);
                self.schedule_reconnect();
            }
            Command::Disconnect(done) => {
                log::info!("Disconnect requested");
                self.teardown().await;
                let _ = done.send(());
            }
            Command::OnMessage(subscriber) => {
                log::debug!("Register message subscriber {}", subscriber.name());
                self.subscriptions.set_message(subscriber);
            }
            Command::OnStatusChange(subscriber) => {
                log::debug!("Register status subscriber {}", subscriber.name());
                self.subscriptions.set_status(subscriber);
            }
        }
    }

    fn start_attempt(&mut self) {
        log::info!("Connecting {} ...", self.config.endpoint);
        self.attempt = Some(Attempt::start(
            self.tokens.clone(),
            self.config.connect_timeout,
        ));
    }

    fn on_progress(&mut self, progress: Progress) {
        match progress {
            Progress::Credential(Ok(token)) => {
                let url = self.config.endpoint.with_token(&token);
                if let Some(attempt) = self.attempt.as_mut() {
                    attempt.open(self.connector.clone(), url);
                }
                self.set_state(ConnectionState::Connecting);
            }
            Progress::Credential(Err(err)) => {
                log::warn!("Fetch credential failed: {}", err);
                self.attempt = None;
                self.finish_attempt(Err(err).context(attempt::error::FetchCredentialFailed));
                // never entered connecting, nothing to clean
                self.set_state(ConnectionState::Reconnecting);
                self.schedule_reconnect();
            }
            Progress::Opened(Ok((sink, stream))) => {
                self.attempt = None;
                self.on_open(sink, stream);
            }
            Progress::Opened(Err(err)) => {
                log::warn!("Open transport to {} failed: {}", self.config.endpoint, err);
                self.attempt = None;
                self.finish_attempt(Err(err).context(attempt::error::OpenTransportFailed {
                    url: self.config.endpoint.to_string(),
                }));
                self.recover(LostReason::OpenFailed);
            }
            Progress::TimedOut(timeout) => {
                log::warn!("Connect attempt timeout after {:?}", timeout);
                self.attempt = None;
                self.finish_attempt(attempt::error::Timeout { timeout }.fail());
                if self.state() == ConnectionState::Connecting {
                    self.recover(LostReason::ConnectTimeout);
                } else {
                    self.set_state(ConnectionState::Reconnecting);
                    self.schedule_reconnect();
                }
            }
        }
    }

    fn on_open(&mut self, sink: FrameSink, stream: FrameStream) {
        self.sink = Some(sink);
        self.stream = Some(stream);
        self.heartbeat = Some(Heartbeat::start(self.config.heartbeat_interval));
        self.watchdog = Some(Watchdog::start(
            self.config.watchdog_interval,
            self.config.silence_window,
        ));

        self.set_state(ConnectionState::Connected);
        self.shared.send_error.send_replace(None);

        log::info!("Connected to {}", self.config.endpoint);

        self.report(true);
        self.finish_attempt(Ok(()));
    }

    fn on_frame(&mut self, frame: Option<Result<String, TransportError>>) {
        let text = match frame {
            None => {
                self.recover(LostReason::PeerClosed);
                return;
            }
            Some(Err(err)) if err.is_fatal() => {
                self.recover(LostReason::Transport(err));
                return;
            }
            Some(Err(err)) => {
                if let Some(watchdog) = self.watchdog.as_mut() {
                    watchdog.touch();
                }
                log::debug!("Transport error happened but ignored: {}", err);
                return;
            }
            Some(Ok(text)) => text,
        };

        if let Some(watchdog) = self.watchdog.as_mut() {
            watchdog.touch();
        }

        match Inbound::decode(&text) {
            Ok(inbound) => {
                log::trace!("Received new {} frame", inbound.type_name());
                match inbound {
                    Inbound::Message(message) => self.subscriptions.deliver(message),
                    Inbound::Pong => {}
                }
            }
            Err(err) => log::warn!("Drop undecodable frame: {}", err),
        }
    }

    async fn on_heartbeat(&mut self) {
        let frame = match Outbound::Ping.encode() {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("Encode heartbeat failed: {}", err);
                return;
            }
        };

        log::trace!("Send ping");

        if let Err(err) = self.write(frame).await {
            self.recover(LostReason::HeartbeatFailed(err));
        }
    }

    async fn on_watchdog(&mut self) {
        let (silence, last_activity) = match self.watchdog.as_ref() {
            Some(w) if w.is_expired(Instant::now()) => (w.silence(), w.last_activity()),
            _ => return,
        };

        log::warn!(
            "No inbound activity for {:?} (last at {:?}), closing connection",
            silence,
            last_activity
        );

        self.close_transport().await;
        self.recover(LostReason::Inactive);
    }

    fn on_reconnect_due(&mut self) {
        self.scheduler.fire();

        if self.state() != ConnectionState::Reconnecting || self.attempt.is_some() {
            log::debug!("Reconnect timer fired in {} state, skip", self.state());
            return;
        }

        self.start_attempt();
    }

    async fn write(&mut self, frame: String) -> Result<(), TransportError> {
        match self.sink.as_mut() {
            Some(sink) => sink.send(frame).await,
            None => Err(TransportError::Closed),
        }
    }

    async fn close_transport(&mut self) {
        self.stream = None;

        if let Some(mut sink) = self.sink.take() {
            match tokio::time::timeout(self.config.connect_timeout, sink.close()).await {
                Ok(Ok(())) => log::debug!("Transport closed"),
                Ok(Err(err)) => log::debug!("Close transport failed: {}", err),
                Err(_) => log::debug!("Close transport timeout, drop it"),
            }
        }
    }

    /// Stop both timers and drop the transport, in one step
    fn cleanup(&mut self) {
        self.heartbeat = None;
        self.watchdog = None;
        self.sink = None;
        self.stream = None;
        self.report(false);
    }

    fn schedule_reconnect(&mut self) {
        if self.scheduler.schedule() {
            log::info!("Reconnect in {:?}", self.scheduler.delay());
        } else {
            log::debug!("Reconnect already pending, ignore duplicate");
        }
    }

    fn recover(&mut self, reason: LostReason) {
        log::warn!("Connection lost: {}", reason);

        self.cleanup();
        self.set_state(ConnectionState::Reconnecting);
        self.schedule_reconnect();
    }

    async fn teardown(&mut self) {
        if self.attempt.take().is_some() {
            log::debug!("Abort in-flight connect attempt");
        }
        self.finish_attempt(Err(ConnectError::Cancelled));

        self.close_transport().await;
        self.cleanup();

        if self.scheduler.cancel() {
            log::debug!("Pending reconnect cancelled");
        }

        self.set_state(ConnectionState::Disconnected);
    }
}

/// Wait next inbound frame, pending forever when there is no transport.
async fn next_frame(stream: &mut Option<FrameStream>) -> Option<Result<String, TransportError>> {
    use futures_util::StreamExt;

    match stream {
        Some(s) => s.next().await,
        None => futures_util::future::pending().await,
    }
}
