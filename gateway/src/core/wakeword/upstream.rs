//! Duplex connection to the streaming recognition service.
//!
//! The connection is split once it is open:
//!
//! ```text
//! InboundRelay ──┐                                   ┌──▶ OutboundRelay
//!                ├─▶ UpstreamSender (Mutex<sink>) ─▶ WS ─▶ UpstreamReceiver
//! OutboundRelay ─┘   (utterance resets)
//! ```
//!
//! Both relays write, so every write goes through one async mutex and a
//! multi-frame sequence (reset handshake, end of utterance) is written while
//! the lock is held. Only the outbound relay reads.

use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, protocol::Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use super::error::{WakewordError, WakewordResult};
use super::messages::{InitMessage, SpeakingMessage};

type UpstreamStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket subprotocol the FunASR server expects.
pub const DEFAULT_SUBPROTOCOL: &str = "binary";

/// An open connection to the recognizer.
pub struct UpstreamChannel {
    sender: UpstreamSender,
    receiver: UpstreamReceiver,
}

impl UpstreamChannel {
    /// Connect to the recognizer. A single attempt; any failure is reported
    /// as [`WakewordError::UpstreamUnreachable`].
    pub async fn open(url: &str, subprotocol: Option<&str>) -> WakewordResult<Self> {
        let mut request = url
            .into_client_request()
            .map_err(|e| WakewordError::UpstreamUnreachable(format!("Invalid URL {url}: {e}")))?;

        if let Some(protocol) = subprotocol {
            let value = HeaderValue::from_str(protocol).map_err(|e| {
                WakewordError::UpstreamUnreachable(format!("Invalid subprotocol {protocol}: {e}"))
            })?;
            request
                .headers_mut()
                .insert("Sec-WebSocket-Protocol", value);
        }

        let (ws_stream, _response) = connect_async(request).await.map_err(|e| {
            WakewordError::UpstreamUnreachable(format!("Failed to connect to {url}: {e}"))
        })?;

        info!("Connected to recognizer at {}", url);

        let (sink, stream) = ws_stream.split();
        Ok(Self {
            sender: UpstreamSender {
                inner: Arc::new(SenderInner {
                    sink: Mutex::new(sink),
                    closed: AtomicBool::new(false),
                }),
            },
            receiver: UpstreamReceiver { stream },
        })
    }

    /// Separate the shared write half from the single-reader half.
    pub fn split(self) -> (UpstreamSender, UpstreamReceiver) {
        (self.sender, self.receiver)
    }
}

struct SenderInner {
    sink: Mutex<SplitSink<UpstreamStream, Message>>,
    closed: AtomicBool,
}

/// Write half of the upstream connection. Clones share the same connection.
#[derive(Clone)]
pub struct UpstreamSender {
    inner: Arc<SenderInner>,
}

impl UpstreamSender {
    /// Send the session handshake. Must precede any audio.
    pub async fn send_init(&self, init: &InitMessage) -> WakewordResult<()> {
        debug!(
            mode = %init.mode,
            hotwords = %init.hotwords,
            "Sending recognizer handshake"
        );
        self.send_control(init).await
    }

    /// Forward a raw audio chunk unchanged.
    pub async fn send_audio(&self, audio: Bytes) -> WakewordResult<()> {
        self.send_frames([Message::Binary(audio)]).await
    }

    /// Send a JSON control frame.
    pub async fn send_control<T: Serialize>(&self, message: &T) -> WakewordResult<()> {
        let json = serde_json::to_string(message)?;
        self.send_frames([Message::Text(json.into())]).await
    }

    /// Close the utterance and flush the last audio chunk as its tail.
    pub async fn end_utterance(&self, audio: Bytes) -> WakewordResult<()> {
        let stop = serde_json::to_string(&SpeakingMessage::STOPPED)?;
        self.send_frames([Message::Text(stop.into()), Message::Binary(audio)])
            .await
    }

    /// Start a fresh sentence so the recognizer does not carry punctuation or
    /// context across an utterance boundary.
    pub async fn reset_utterance(&self) -> WakewordResult<()> {
        let stop = serde_json::to_string(&SpeakingMessage::STOPPED)?;
        let start = serde_json::to_string(&SpeakingMessage::STARTED)?;
        self.send_frames([Message::Text(stop.into()), Message::Text(start.into())])
            .await
    }

    /// Close the connection. Only the first call has an effect.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            debug!("Upstream already closed");
            return;
        }
        let mut sink = self.inner.sink.lock().await;
        if let Err(e) = sink.close().await {
            debug!("Upstream close handshake failed: {}", e);
        }
        info!("Upstream connection closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    async fn send_frames<const N: usize>(&self, frames: [Message; N]) -> WakewordResult<()> {
        if self.is_closed() {
            return Err(WakewordError::UpstreamClosed);
        }
        let mut sink = self.inner.sink.lock().await;
        for frame in frames {
            sink.send(frame).await.map_err(map_ws_error)?;
        }
        Ok(())
    }
}

/// Read half of the upstream connection.
pub struct UpstreamReceiver {
    stream: SplitStream<UpstreamStream>,
}

impl UpstreamReceiver {
    /// Wait for the next text frame.
    ///
    /// Binary and ping/pong frames are skipped. A closed connection yields
    /// [`WakewordError::UpstreamClosed`].
    pub async fn recv(&mut self) -> WakewordResult<String> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Close(frame))) => {
                    debug!("Recognizer sent close: {:?}", frame);
                    return Err(WakewordError::UpstreamClosed);
                }
                Some(Ok(Message::Binary(data))) => {
                    debug!("Ignoring {} byte binary frame from recognizer", data.len());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(map_ws_error(e)),
                None => return Err(WakewordError::UpstreamClosed),
            }
        }
    }
}

fn map_ws_error(error: tungstenite::Error) -> WakewordError {
    use tungstenite::error::ProtocolError;

    match error {
        tungstenite::Error::ConnectionClosed
        | tungstenite::Error::AlreadyClosed
        | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
            WakewordError::UpstreamClosed
        }
        tungstenite::Error::Io(ref io)
            if matches!(
                io.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ) =>
        {
            WakewordError::UpstreamClosed
        }
        other => WakewordError::Upstream(other.to_string()),
    }
}
