//! Connection manager configuration.

use std::time::Duration;

use crate::api::types::SocketUrl;

/// interval between two heartbeat probes
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// interval between two inactivity checks
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(60);

/// max tolerated duration with no inbound activity
pub const DEFAULT_SILENCE_WINDOW: Duration = Duration::from_secs(10 * 60);

/// delay before a scheduled reconnect attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// bound of credential fetch plus transport handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings of one [`ConnectionManager`](crate::ws::ConnectionManager).
#[derive(Debug, Clone)]
pub struct Config {
    /// socket base url, credential is appended per attempt
    pub endpoint: SocketUrl,
    /// heartbeat probe interval
    pub heartbeat_interval: Duration,
    /// inactivity check interval
    pub watchdog_interval: Duration,
    /// connection is closed after this long without inbound frames
    pub silence_window: Duration,
    /// fixed delay before reconnect
    pub reconnect_delay: Duration,
    /// bound of one connect attempt, also bounds a graceful close
    pub connect_timeout: Duration,
}

impl Config {
    /// Create config with default timings
    pub fn new(endpoint: SocketUrl) -> Self {
        Self {
            endpoint,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            watchdog_interval: DEFAULT_WATCHDOG_INTERVAL,
            silence_window: DEFAULT_SILENCE_WINDOW,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// set heartbeat probe interval
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// set inactivity check interval
    pub fn with_watchdog_interval(mut self, interval: Duration) -> Self {
        self.watchdog_interval = interval;
        self
    }

    /// set max tolerated silence
    pub fn with_silence_window(mut self, window: Duration) -> Self {
        self.silence_window = window;
        self
    }

    /// set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// set connect attempt timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
