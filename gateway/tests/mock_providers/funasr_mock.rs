//! WebSocket Mock Server for the FunASR streaming recognizer
//!
//! Accepts the `binary` subprotocol, records every frame it receives and
//! replies to audio frames with scripted recognition results.

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;

/// A frame received from the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Json(Value),
    Audio(Vec<u8>),
}

impl Received {
    pub fn is_speaking(&self) -> Option<bool> {
        match self {
            Self::Json(value) if value.as_object().is_some_and(|o| o.len() == 1) => {
                value.get("is_speaking").and_then(Value::as_bool)
            }
            _ => None,
        }
    }
}

/// What the mock does with each audio frame.
#[derive(Debug, Clone, Default)]
pub struct FunAsrScript {
    /// Results sent after the n-th audio frame (0-based). A JSON string value
    /// is sent as its raw contents, so non-JSON frames can be scripted.
    pub replies: Vec<Vec<Value>>,
    /// Close the connection right after the handshake
    pub close_after_init: bool,
}

/// Shared mock state
#[derive(Debug, Default)]
pub struct FunAsrMockState {
    pub received: Mutex<Vec<Received>>,
    pub subprotocols: Mutex<Vec<Option<String>>>,
    pub connection_count: AtomicUsize,
    pub disconnected: AtomicBool,
}

impl FunAsrMockState {
    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    /// First JSON frame, the session handshake
    pub fn init_message(&self) -> Option<Value> {
        self.received().into_iter().find_map(|frame| match frame {
            Received::Json(value) if value.get("mode").is_some() => Some(value),
            _ => None,
        })
    }
}

/// A running mock recognizer
pub struct FunAsrMock {
    pub url: String,
    pub state: Arc<FunAsrMockState>,
}

impl FunAsrMock {
    pub async fn start(script: FunAsrScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let state = Arc::new(FunAsrMockState::default());

        let server_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = server_state.clone();
                let script = script.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state, script).await {
                        eprintln!("Mock FunASR connection error: {}", e);
                    }
                });
            }
        });

        Self { url, state }
    }

    /// Poll until `predicate` holds or the timeout expires.
    pub async fn wait_until<F>(&self, predicate: F) -> bool
    where
        F: Fn(&FunAsrMockState) -> bool,
    {
        for _ in 0..200 {
            if predicate(&self.state) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<FunAsrMockState>,
    script: FunAsrScript,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let protocol_state = state.clone();
    let callback = move |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        let protocol = request.headers().get(SEC_WEBSOCKET_PROTOCOL).cloned();
        protocol_state
            .subprotocols
            .lock()
            .unwrap()
            .push(protocol.as_ref().and_then(|p| p.to_str().ok()).map(str::to_string));
        if let Some(protocol) = protocol {
            response.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocol);
        }
        Ok(response)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();
    state.connection_count.fetch_add(1, Ordering::SeqCst);

    let mut audio_index = 0usize;

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let value: Value = serde_json::from_str(text.as_str())?;
                let is_init = value.get("mode").is_some();
                state.received.lock().unwrap().push(Received::Json(value));
                if is_init && script.close_after_init {
                    write.send(Message::Close(None)).await?;
                    break;
                }
            }
            Ok(Message::Binary(data)) => {
                state
                    .received
                    .lock()
                    .unwrap()
                    .push(Received::Audio(data.to_vec()));
                if let Some(replies) = script.replies.get(audio_index) {
                    for reply in replies {
                        let text = match reply {
                            Value::String(raw) => raw.clone(),
                            other => other.to_string(),
                        };
                        write.send(Message::Text(text.into())).await?;
                    }
                }
                audio_index += 1;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(data)) => {
                write.send(Message::Pong(data)).await?;
            }
            Err(_) => break,
            _ => {}
        }
    }

    state.disconnected.store(true, Ordering::SeqCst);
    Ok(())
}
