use std::fmt::Display;

/// Connection lifecycle state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// initial state, and the state after an explicit disconnect
    #[default]
    Disconnected,
    /// credential fetched, transport handshake in progress
    Connecting,
    /// transport open, heartbeat and watchdog running
    Connected,
    /// connection lost, waiting for the scheduled reconnect
    Reconnecting,
}

impl ConnectionState {
    /// get state name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
