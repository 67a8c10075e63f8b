//! Transport boundary: how the connection manager opens a socket.

use std::pin::Pin;

use futures_util::{stream::BoxStream, Sink, StreamExt};
use snafu::prelude::*;
use tokio_tungstenite as websocket;

use super::message::TextFrames;

pub(crate) type WebsocketClient =
    websocket::WebSocketStream<websocket::MaybeTlsStream<tokio::net::TcpStream>>;

/// Write half of an opened transport.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Read half of an opened transport, ends when the peer closed the connection.
pub type FrameStream = BoxStream<'static, Result<String, TransportError>>;

/// Error when open, read or write the transport
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum TransportError {
    /// underlying websocket broken
    #[snafu(display("underlying websocket broken: {source}"))]
    Websocket {
        /// source error
        source: websocket::tungstenite::Error,
    },

    /// peer closed the connection
    #[snafu(display("connection closed by peer"))]
    Closed,

    /// received a frame that is not text
    #[snafu(display("received a non-text frame"))]
    NonTextFrame,

    /// error reported by a custom connector
    #[snafu(display("{message}"))]
    Custom {
        /// error description
        message: String,
    },
}

impl TransportError {
    /// Check if this error will end the connection
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NonTextFrame)
    }
}

/// Opens the persistent connection.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    /// open a connection to `url`, returning its write and read halves
    async fn connect(&self, url: &url::Url) -> Result<(FrameSink, FrameStream), TransportError>;
}

/// [`Connector`] over websocket, plain or tls.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebsocketConnector;

#[async_trait::async_trait]
impl Connector for WebsocketConnector {
    async fn connect(&self, url: &url::Url) -> Result<(FrameSink, FrameStream), TransportError> {
        let (ws, _) = websocket::connect_async(url)
            .await
            .context(error::Websocket)?;

        let (sink, stream) = TextFrames::new(ws).split();
        let sink: FrameSink = Box::pin(sink);

        Ok((sink, stream.boxed()))
    }
}
