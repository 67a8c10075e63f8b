use std::task::Poll;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite as websocket;

use crate::ws::transport::{TransportError, WebsocketClient};

/// Websocket connection seen as a stream/sink of text frames.
#[derive(Debug)]
pub(crate) struct TextFrames {
    ws: WebsocketClient,
}

impl TextFrames {
    pub fn new(ws: WebsocketClient) -> Self {
        Self { ws }
    }
}

impl Stream for TextFrames {
    type Item = Result<String, TransportError>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        match self.ws.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Ready(Some(frame)) => {
                let result = match frame {
                    Err(source) => Err(TransportError::Websocket { source }),
                    Ok(websocket::Message::Text(text)) => Ok(text),
                    Ok(websocket::Message::Binary(data)) => {
                        String::from_utf8(data).map_err(|_| TransportError::NonTextFrame)
                    }
                    Ok(websocket::Message::Close(frame)) => {
                        log::debug!("Received close frame: {:?}", frame);
                        Err(TransportError::Closed)
                    }
                    Ok(_) => Err(TransportError::NonTextFrame),
                };
                Poll::Ready(Some(result))
            }
        }
    }
}

impl Sink<String> for TextFrames {
    type Error = TransportError;

    fn poll_ready(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws
            .poll_ready_unpin(cx)
            .map_err(|e| Self::Error::Websocket { source: e })
    }

    fn start_send(mut self: std::pin::Pin<&mut Self>, item: String) -> Result<(), Self::Error> {
        self.ws
            .start_send_unpin(websocket::Message::Text(item))
            .map_err(|e| Self::Error::Websocket { source: e })
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws
            .poll_flush_unpin(cx)
            .map_err(|e| Self::Error::Websocket { source: e })
    }

    fn poll_close(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws
            .poll_close_unpin(cx)
            .map_err(|e| Self::Error::Websocket { source: e })
    }
}
