//! WebSocket framing for the gateway: JSON accepting [Stream]s and [Sink]s.

use std::io::Read;
use std::pin::Pin;
use std::task::{Context, Poll};

use flate2::read::ZlibDecoder;
use futures::stream::{SplitSink, SplitStream};
use futures::{ready, Sink, SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::trace;

use crate::model::GatewayEvent;
use crate::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open a TLS websocket to the given gateway URL and split it into a
/// receiving and a sending half.
pub(crate) async fn connect(url: &str) -> Result<(JsonSink, EventStream)> {
    trace!("Connecting websocket: {}", url);
    let (ws, _response) = connect_async(url).await?;
    let (sink, stream) = ws.split();
    Ok((JsonSink { inner: sink }, EventStream { inner: stream }))
}

/// A stream of decoded gateway envelopes.
///
/// Text frames are parsed as JSON directly; binary frames are zlib-inflated
/// first. A close frame surfaces as [`Error::Closed`] carrying the peer's
/// close code and reason.
#[derive(Debug)]
pub(crate) struct EventStream {
    inner: SplitStream<WsStream>,
}

impl EventStream {
    /// Receive the next envelope, blocking until one is available.
    pub async fn recv(&mut self) -> Result<GatewayEvent> {
        match self.next().await {
            Some(result) => result,
            None => Err(Error::Closed(None, "Connection interrupted".to_owned())),
        }
    }
}

impl Stream for EventStream {
    type Item = Result<GatewayEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let message = match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(message)) => message,
                Some(Err(err)) => return Poll::Ready(Some(Err(Error::WebSocket(err)))),
                None => return Poll::Ready(None),
            };

            let value = match message {
                Message::Text(text) => serde_json::from_str::<Value>(&text),
                Message::Binary(bin) => match inflate(&bin) {
                    Ok(text) => serde_json::from_str::<Value>(&text),
                    Err(err) => return Poll::Ready(Some(Err(err))),
                },
                Message::Close(frame) => {
                    let (code, reason) = match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
                        None => (None, String::new()),
                    };
                    return Poll::Ready(Some(Err(Error::Closed(code, reason))));
                }
                // Pings are answered by the protocol layer.
                _ => continue,
            };

            return Poll::Ready(Some(match value {
                Ok(value) => GatewayEvent::decode(value),
                Err(err) => Err(Error::Json(err)),
            }));
        }
    }
}

fn inflate(bytes: &[u8]) -> Result<String> {
    let mut text = String::new();
    ZlibDecoder::new(bytes).read_to_string(&mut text)?;
    Ok(text)
}

/// JSON-encoded values sent to the websocket peer.
#[derive(Debug)]
pub(crate) struct JsonSink {
    inner: SplitSink<WsStream, Message>,
}

impl JsonSink {
    /// Send a close frame with the given code and an empty reason.
    pub async fn close(&mut self, code: u16) -> Result<()> {
        self.inner
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: "".into(),
            })))
            .await
            .map_err(From::from)
    }
}

impl Sink<Value> for JsonSink {
    type Error = Error;

    fn start_send(mut self: Pin<&mut Self>, item: Value) -> Result<()> {
        let json = serde_json::to_string(&item)?;
        self.inner
            .start_send_unpin(Message::Text(json))
            .map_err(From::from)
    }

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready_unpin(cx).map_err(From::from)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_flush_unpin(cx).map_err(From::from)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_close_unpin(cx).map_err(From::from)
    }
}
