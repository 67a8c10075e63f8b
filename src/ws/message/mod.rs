//! Chat socket frame types and codec.

mod stream;
mod types;

pub(crate) use stream::TextFrames;
pub use types::{ChatMessage, Ping};

use enum_as_inner::EnumAsInner;
use snafu::prelude::*;

/// The heartbeat response literal, never json encoded.
pub const PONG_FRAME: &str = "pong";

/// Error when parse a text frame as inbound message
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)), module(error), context(suffix(false)))]
pub enum DecodeError {
    /// frame is invalid json
    #[snafu(display("parse json failed: {source}, frame: {frame}"))]
    ParseJSONFailed {
        /// frame text
        frame: String,
        /// source error
        source: serde_json::Error,
    },

    /// frame json is not a chat message
    #[snafu(display("frame is not a chat message: {source}, frame: {frame}"))]
    NotChatMessage {
        /// frame text
        frame: String,
        /// source error
        source: serde_json::Error,
    },
}

/// Error when encode an outbound message as text frame
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)), module(encode_error), context(suffix(false)))]
pub enum EncodeError {
    /// serialize to json failed
    #[snafu(display("encode {type_name} frame failed: {source}"))]
    SerializeFailed {
        /// outbound type name
        type_name: &'static str,
        /// source error
        source: serde_json::Error,
    },
}

/// Frame received from server
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Inbound {
    /// application message, delivered to message subscriber
    Message(ChatMessage),
    /// heartbeat response, consumed internally
    Pong,
}

impl Inbound {
    /// Decode a text frame
    pub fn decode(frame: &str) -> Result<Self, DecodeError> {
        // control literal is matched before any parse
        if frame == PONG_FRAME {
            return Ok(Self::Pong);
        }

        let value: serde_json::Value =
            serde_json::from_str(frame).context(error::ParseJSONFailed { frame })?;

        serde_json::from_value(value)
            .map(Self::Message)
            .context(error::NotChatMessage { frame })
    }

    /// get type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Message(_) => "Message",
            Self::Pong => "Pong",
        }
    }
}

/// Frame sent to server
#[derive(Debug, Clone, Copy)]
pub enum Outbound<'a> {
    /// application message
    Message(&'a ChatMessage),
    /// heartbeat probe
    Ping,
}

impl Outbound<'_> {
    /// Encode to a text frame
    pub fn encode(&self) -> Result<String, EncodeError> {
        let result = match self {
            Self::Message(message) => serde_json::to_string(message),
            Self::Ping => serde_json::to_string(&Ping::default()),
        };

        result.context(encode_error::SerializeFailed {
            type_name: self.type_name(),
        })
    }

    /// get type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Message(_) => "Message",
            Self::Ping => "Ping",
        }
    }
}

#[cfg(test)]
mod test {
    mod decode {
        use super::super::*;
        use serde_json::json;

        #[test]
        fn test_frame_decode_pong() {
            let msg = Inbound::decode("pong").unwrap();
            assert!(msg.is_pong());
        }

        #[test]
        fn test_frame_decode_json_pong_is_not_control() {
            // only the bare literal is a control frame
            let err = Inbound::decode("\"pong\"").unwrap_err();
            assert!(matches!(err, DecodeError::NotChatMessage { .. }));
        }

        #[test]
        fn test_frame_decode_message() {
            let frame = json!({
                "id": "m-1",
                "content": "hello",
                "sender": "alice",
                "timestamp": "2024-01-01T00:00:00.000Z",
            })
            .to_string();

            let msg = Inbound::decode(&frame).unwrap().into_message().unwrap();

            assert_eq!(msg.id.as_deref(), Some("m-1"));
            assert_eq!(msg.content, "hello");
            assert_eq!(msg.sender, "alice");
        }

        #[test]
        fn test_frame_decode_invalid_json() {
            let err = Inbound::decode("{not json").unwrap_err();
            assert!(matches!(err, DecodeError::ParseJSONFailed { .. }));
        }

        #[test]
        fn test_frame_decode_wrong_shape() {
            let frame = json!({ "type": "ping" }).to_string();
            let err = Inbound::decode(&frame).unwrap_err();
            assert!(matches!(err, DecodeError::NotChatMessage { .. }));
        }
    }

    mod encode {
        use super::super::*;
        use serde_json::json;

        #[test]
        fn test_frame_encode_ping() {
            let frame = Outbound::Ping.encode().unwrap();
            let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(value, json!({ "type": "ping" }));
        }

        #[test]
        fn test_frame_encode_message_without_id() {
            let msg = ChatMessage::new("bob", "hi", "2024-01-01T00:00:00.000Z");
            let frame = Outbound::Message(&msg).encode().unwrap();
            let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(
                value,
                json!({
                    "content": "hi",
                    "sender": "bob",
                    "timestamp": "2024-01-01T00:00:00.000Z",
                })
            );
        }
    }
}
