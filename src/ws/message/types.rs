use serde::{Deserialize, Serialize};

/// Chat message, both delivered to and sent by the application.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// server assigned message id, absent on outbound messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// message body
    pub content: String,
    /// sender user name
    pub sender: String,
    /// send time, ISO 8601 text
    pub timestamp: String,
}

impl ChatMessage {
    /// Create an outbound message, the server will assign the id
    pub fn new<S, C, T>(sender: S, content: C, timestamp: T) -> Self
    where
        S: Into<String>,
        C: Into<String>,
        T: Into<String>,
    {
        Self {
            id: None,
            content: content.into(),
            sender: sender.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Heartbeat probe, client -> server
#[derive(Debug, Copy, Clone, Serialize)]
pub struct Ping {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl Default for Ping {
    fn default() -> Self {
        Self { kind: "ping" }
    }
}
