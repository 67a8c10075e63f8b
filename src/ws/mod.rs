//! Realtime chat socket client

mod client;
pub(crate) mod message;
pub mod transport;

pub use client::{ConnectError, ConnectionManager, ConnectionState, SendError};
pub use message::{ChatMessage, DecodeError, EncodeError, Inbound, Outbound, PONG_FRAME};
pub use transport::{Connector, TransportError, WebsocketConnector};
