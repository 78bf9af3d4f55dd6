//! Wake-word WebSocket handler

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

use super::messages::{ClientRoute, ClientSender, WakewordQuery};
use super::session::{Session, SessionParams};

/// Optimized channel buffer size for audio workloads
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Wake-word WebSocket handler
///
/// Upgrades the connection and runs one wake-word session over it. The query
/// parameters `mode`, `wakewords` and `sensitivity` override the configured
/// defaults for this session only.
pub async fn wakeword_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WakewordQuery>,
) -> Response {
    info!(
        mode = ?query.mode,
        wakewords = ?query.wakewords,
        "Wake-word WebSocket connection upgrade requested"
    );

    let params = session_params(&state, query);

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_wakeword_socket(socket, params))
}

/// Resolve the session parameters from configuration and the upgrade query.
fn session_params(state: &AppState, query: WakewordQuery) -> SessionParams {
    let config = &state.config;

    let mode = query
        .mode
        .map(|mode| mode.trim().to_string())
        .filter(|mode| !mode.is_empty())
        .unwrap_or_else(|| config.wakeword_mode.clone());

    let sensitivity = match query.sensitivity {
        Some(value) if (0.0..=1.0).contains(&value) => value,
        Some(value) => {
            warn!(
                "Ignoring out-of-range sensitivity {}, using {}",
                value, config.wakeword_sensitivity
            );
            config.wakeword_sensitivity
        }
        None => config.wakeword_sensitivity,
    };

    let phrases = config.wakewords.with_override(query.wakewords.as_deref());
    if phrases.is_empty() {
        warn!("No wake phrases configured; transcripts will be relayed without detection");
    }

    SessionParams {
        upstream_url: config.funasr_url.clone(),
        subprotocol: config.funasr_subprotocol.clone(),
        mode,
        wav_name: config.wakeword_wav_name.clone(),
        phrases,
        sensitivity,
    }
}

/// Handle the wake-word WebSocket connection
async fn handle_wakeword_socket(socket: WebSocket, params: SessionParams) {
    let (mut sender, receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<ClientRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task for outgoing frames
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let result = match route {
                ClientRoute::Frame(frame) => match frame.encode() {
                    Ok(data) => sender.send(Message::Binary(data)).await,
                    Err(e) => {
                        error!("Failed to encode {} frame: {}", frame.action, e);
                        continue;
                    }
                },
                ClientRoute::Close => {
                    debug!("Closing wake-word WebSocket connection");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let client = ClientSender::new(message_tx);
    let session = Session::new(params, client.clone());
    let session_id = session.id().to_string();
    info!(session_id = %session_id, "Wake-word WebSocket connection established");

    let outcome = session.run(receiver).await;

    client.close().await;
    drop(client);
    if let Err(e) = sender_task.await {
        error!(session_id = %session_id, "Sender task failed: {}", e);
    }

    info!(
        session_id = %session_id,
        outcome = %outcome,
        "Wake-word WebSocket connection terminated"
    );
}
