//! The two relay tasks of a session.
//!
//! - inbound: client frames to the recognizer (audio, end of utterance, stop)
//! - outbound: recognizer results to the client (partials, finals, wake events)
//!
//! Each relay ends with a [`RelayExit`]. Disconnects of either peer are
//! normal exits; any other error is reported to the client as `ERROR`.

use axum::extract::ws::Message;
use futures::{Stream, StreamExt};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::wakeword::{
    RecognitionFragment, TranscriptAccumulator, UpstreamReceiver, UpstreamSender, WakePhraseSet,
    WakewordError, WakewordResult, detect,
};

use super::messages::{ClientSender, WakewordDetectedPayload};
use super::protocol::{ClientAction, decode};

/// How a relay task ended.
#[derive(Debug)]
pub enum RelayExit {
    /// The client sent `ENGINE_STOP`
    Stopped,
    /// A peer went away
    Disconnected,
    /// The sibling relay ended first
    Cancelled,
    /// A fault, already reported to the client
    Failed(WakewordError),
}

impl RelayExit {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Turn a relay result into its exit, reporting faults to the client.
async fn conclude(
    relay: &'static str,
    session_id: &str,
    result: WakewordResult<RelayExit>,
    client: &ClientSender,
) -> RelayExit {
    match result {
        Ok(exit) => {
            debug!(session_id, relay, ?exit, "Relay finished");
            exit
        }
        Err(e) if e.is_disconnect() => {
            debug!(session_id, relay, "Relay ended by disconnect: {}", e);
            RelayExit::Disconnected
        }
        Err(e) => {
            error!(session_id, relay, "Relay failed: {}", e);
            client.report_error(&e).await;
            RelayExit::Failed(e)
        }
    }
}

/// Client to recognizer.
pub async fn run_inbound<S>(
    session_id: String,
    client_stream: S,
    client: ClientSender,
    upstream: UpstreamSender,
    cancel: CancellationToken,
) -> RelayExit
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let result = inbound_loop(&session_id, client_stream, &client, &upstream, &cancel).await;
    let exit = conclude("inbound", &session_id, result, &client).await;

    upstream.close().await;
    cancel.cancel();
    exit
}

async fn inbound_loop<S>(
    session_id: &str,
    mut client_stream: S,
    client: &ClientSender,
    upstream: &UpstreamSender,
    cancel: &CancellationToken,
) -> WakewordResult<RelayExit>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let message = select! {
            biased;
            _ = cancel.cancelled() => return Ok(RelayExit::Cancelled),
            message = client_stream.next() => message,
        };

        let data = match message {
            Some(Ok(Message::Binary(data))) => data,
            Some(Ok(Message::Text(_))) => {
                return Err(WakewordError::ProtocolViolation(
                    "text frames are not supported".to_string(),
                ));
            }
            Some(Ok(Message::Close(_))) | None => return Err(WakewordError::ClientDisconnected),
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                debug!(session_id, "Client WebSocket error: {}", e);
                return Err(WakewordError::ClientDisconnected);
            }
        };

        let frame = decode(data).map_err(|e| WakewordError::MalformedFrame(e.to_string()))?;

        match frame.action {
            ClientAction::Ping => client.signal(ClientAction::Pong).await?,
            ClientAction::EngineStart => {
                return Err(WakewordError::ProtocolViolation(
                    "already started".to_string(),
                ));
            }
            ClientAction::EnginePartialInput => {
                debug!(session_id, bytes = frame.payload.len(), "Forwarding audio");
                upstream.send_audio(frame.payload).await?;
            }
            ClientAction::EngineFinalInput => {
                debug!(
                    session_id,
                    bytes = frame.payload.len(),
                    "Forwarding final audio"
                );
                upstream.end_utterance(frame.payload).await?;
            }
            ClientAction::EngineStop => {
                info!(session_id, "Client requested stop");
                upstream.close().await;
                client.signal(ClientAction::EngineStopped).await?;
                return Ok(RelayExit::Stopped);
            }
            other => return Err(WakewordError::ProtocolViolation(other.to_string())),
        }
    }
}

/// Recognizer to client.
pub async fn run_outbound(
    session_id: String,
    receiver: UpstreamReceiver,
    upstream: UpstreamSender,
    client: ClientSender,
    phrases: WakePhraseSet,
    cancel: CancellationToken,
) -> RelayExit {
    let result = outbound_loop(&session_id, receiver, &upstream, &client, &phrases, &cancel).await;
    let exit = conclude("outbound", &session_id, result, &client).await;

    cancel.cancel();
    exit
}

async fn outbound_loop(
    session_id: &str,
    mut receiver: UpstreamReceiver,
    upstream: &UpstreamSender,
    client: &ClientSender,
    phrases: &WakePhraseSet,
    cancel: &CancellationToken,
) -> WakewordResult<RelayExit> {
    let mut accumulator = TranscriptAccumulator::new();
    // Whether the current utterance has matched, for the completion log only
    let mut woke = false;

    loop {
        let raw = select! {
            biased;
            _ = cancel.cancelled() => return Ok(RelayExit::Cancelled),
            raw = receiver.recv() => raw?,
        };

        let Some(fragment) = RecognitionFragment::parse(&raw)? else {
            warn!(session_id, "Ignoring recognizer frame without mode: {}", raw);
            continue;
        };
        debug!(
            session_id,
            mode = fragment.mode.as_str(),
            is_final = fragment.is_final,
            "Recognizer result: {}",
            fragment.text
        );

        let output = accumulator.apply(&fragment);

        if let Some(event) = detect(&output.text, phrases) {
            info!(
                session_id,
                phrase = %event.matched_phrase,
                "Wake phrase detected in '{}'",
                event.text
            );
            let payload = serde_json::to_vec(&WakewordDetectedPayload::from(event))?;
            client.send(ClientAction::WakewordDetected, payload).await?;
            woke = true;
        }

        if output.is_final {
            client
                .send(ClientAction::EngineFinalOutput, output.text.clone())
                .await?;
            if woke {
                info!(session_id, "Wake phrase utterance completed: '{}'", output.text);
                woke = false;
            }
            accumulator.reset();
            upstream.reset_utterance().await?;
        } else {
            client
                .send(ClientAction::EnginePartialOutput, output.text)
                .await?;
        }
    }
}
