//! Session lifecycle.
//!
//! ```text
//! INITIALIZING ──▶ STARTED ──▶ RUNNING ──▶ STOPPED
//!       │                         │
//!       └─────────────────────────┴──────▶ ERRORED
//! ```

use axum::extract::ws::Message;
use futures::Stream;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::core::wakeword::{
    InitMessage, UpstreamChannel, UpstreamReceiver, UpstreamSender, WakePhraseSet, WakewordError,
    WakewordResult,
};

use super::messages::ClientSender;
use super::protocol::ClientAction;
use super::relay::{RelayExit, run_inbound, run_outbound};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Started,
    Running,
    Stopped,
    Errored,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Errored)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "INITIALIZING",
            Self::Started => "STARTED",
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Errored => "ERRORED",
        };
        f.write_str(name)
    }
}

/// Everything a session needs, resolved before it starts.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub upstream_url: String,
    pub subprotocol: Option<String>,
    /// Recognition mode sent in the handshake
    pub mode: String,
    pub wav_name: String,
    pub phrases: WakePhraseSet,
    pub sensitivity: f32,
}

/// One client connection relayed to one recognizer connection.
pub struct Session {
    id: String,
    params: SessionParams,
    client: ClientSender,
    state: SessionState,
}

impl Session {
    pub fn new(params: SessionParams, client: ClientSender) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            params,
            client,
            state: SessionState::Initializing,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        info!(session_id = %self.id, from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    /// Run the session to completion and return its terminal state.
    pub async fn run<S>(mut self, client_stream: S) -> SessionState
    where
        S: Stream<Item = Result<Message, axum::Error>> + Unpin + Send + 'static,
    {
        info!(
            session_id = %self.id,
            mode = %self.params.mode,
            phrases = ?self.params.phrases,
            sensitivity = self.params.sensitivity,
            "Starting wake-word session"
        );

        if self
            .client
            .signal(ClientAction::EngineInitializing)
            .await
            .is_err()
        {
            self.transition(SessionState::Stopped);
            return self.state;
        }

        let (upstream, receiver) = match self.connect().await {
            Ok(halves) => halves,
            Err(e) => {
                error!(session_id = %self.id, "Session setup failed: {}", e);
                if !e.is_disconnect() {
                    self.client.report_error(&e).await;
                }
                self.transition(SessionState::Errored);
                return self.state;
            }
        };

        self.transition(SessionState::Started);
        if self.client.signal(ClientAction::EngineStarted).await.is_err() {
            upstream.close().await;
            self.transition(SessionState::Stopped);
            return self.state;
        }

        let cancel = CancellationToken::new();
        let inbound = tokio::spawn(run_inbound(
            self.id.clone(),
            client_stream,
            self.client.clone(),
            upstream.clone(),
            cancel.clone(),
        ));
        let outbound = tokio::spawn(run_outbound(
            self.id.clone(),
            receiver,
            upstream.clone(),
            self.client.clone(),
            self.params.phrases.clone(),
            cancel.clone(),
        ));
        self.transition(SessionState::Running);

        let (inbound_exit, outbound_exit) = tokio::join!(inbound, outbound);
        upstream.close().await;

        let inbound_exit = join_exit("inbound", &self.id, inbound_exit);
        let outbound_exit = join_exit("outbound", &self.id, outbound_exit);
        info!(
            session_id = %self.id,
            inbound = ?inbound_exit,
            outbound = ?outbound_exit,
            "Relays finished"
        );

        if inbound_exit.is_failure() || outbound_exit.is_failure() {
            self.transition(SessionState::Errored);
        } else {
            self.transition(SessionState::Stopped);
        }
        self.state
    }

    /// Open the recognizer connection and send the handshake.
    async fn connect(&self) -> WakewordResult<(UpstreamSender, UpstreamReceiver)> {
        let channel = UpstreamChannel::open(
            &self.params.upstream_url,
            self.params.subprotocol.as_deref(),
        )
        .await?;

        let init = InitMessage::new(
            &self.params.mode,
            &self.params.wav_name,
            self.params.phrases.hotwords(),
        );
        let (upstream, receiver) = channel.split();
        if let Err(e) = upstream.send_init(&init).await {
            upstream.close().await;
            return Err(e);
        }
        Ok((upstream, receiver))
    }
}

fn join_exit(
    relay: &'static str,
    session_id: &str,
    result: Result<RelayExit, tokio::task::JoinError>,
) -> RelayExit {
    result.unwrap_or_else(|e| {
        error!(session_id, relay, "Relay task panicked: {}", e);
        RelayExit::Failed(WakewordError::Upstream(format!("{relay} relay aborted")))
    })
}
