//! Wake-word WebSocket message types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::core::wakeword::{WakeEvent, WakewordError, WakewordResult};

use super::protocol::{ClientAction, ClientFrame};

/// Query parameters of the `/wakeword` upgrade request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WakewordQuery {
    /// Recognition mode (`online`, `offline` or `2pass`)
    pub mode: Option<String>,
    /// Comma-separated wake phrases replacing the configured ones
    pub wakewords: Option<String>,
    /// Detection sensitivity in `[0, 1]`. Accepted and logged; matching is
    /// exact substring search and does not use it.
    pub sensitivity: Option<f32>,
}

/// Body of a `WAKEWORD_DETECTED` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakewordDetectedPayload {
    pub text: String,
    pub wakeword: bool,
    pub phrase: String,
}

impl From<WakeEvent> for WakewordDetectedPayload {
    fn from(event: WakeEvent) -> Self {
        Self {
            text: event.text,
            wakeword: true,
            phrase: event.matched_phrase,
        }
    }
}

/// Work item for the client writer task.
#[derive(Debug)]
pub enum ClientRoute {
    Frame(ClientFrame),
    Close,
}

/// Handle for writing to the client.
///
/// Every frame goes through one channel drained by a single writer task, so
/// frames from the two relays never interleave.
#[derive(Debug, Clone)]
pub struct ClientSender {
    tx: mpsc::Sender<ClientRoute>,
}

impl ClientSender {
    pub fn new(tx: mpsc::Sender<ClientRoute>) -> Self {
        Self { tx }
    }

    /// Queue a frame. Fails with [`WakewordError::ClientDisconnected`] once
    /// the writer task is gone.
    pub async fn send(&self, action: ClientAction, payload: impl Into<Bytes>) -> WakewordResult<()> {
        self.tx
            .send(ClientRoute::Frame(ClientFrame::new(action, payload)))
            .await
            .map_err(|_| WakewordError::ClientDisconnected)
    }

    /// Queue a frame with an empty payload.
    pub async fn signal(&self, action: ClientAction) -> WakewordResult<()> {
        self.send(action, Bytes::new()).await
    }

    /// Report an error to the client. Delivery failures are swallowed.
    pub async fn report_error(&self, error: &WakewordError) {
        if self.send(ClientAction::Error, error.to_string()).await.is_err() {
            debug!("Client gone, dropping error report: {}", error);
        }
    }

    /// Ask the writer task to close the connection.
    pub async fn close(&self) {
        let _ = self.tx.send(ClientRoute::Close).await;
    }
}
