//! Wake-word session integration tests
//!
//! Runs the real router on an ephemeral port against a mock FunASR server and
//! drives it with a WebSocket client speaking the framed action protocol.

mod mock_providers;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use mock_providers::{FunAsrMock, FunAsrScript, Received};
use wakeword_gateway::handlers::wakeword::{ClientAction, ClientFrame, decode, encode};
use wakeword_gateway::{ServerConfig, WakePhraseSet, routes, state::AppState};

type ClientWs = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn test_config(funasr_url: &str, wakewords: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        cors_allowed_origins: None,
        funasr_url: funasr_url.to_string(),
        funasr_subprotocol: Some("binary".to_string()),
        wakeword_mode: "2pass".to_string(),
        wakewords: WakePhraseSet::parse(wakewords),
        wakeword_sensitivity: 0.5,
        wakeword_wav_name: "wakeword".to_string(),
        dify: None,
    }
}

async fn start_gateway(config: ServerConfig) -> SocketAddr {
    let state = AppState::new(config).await;
    let app = routes::create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, query: &str) -> ClientWs {
    let url = format!("ws://{addr}/wakeword{query}");
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

async fn send(ws: &mut ClientWs, action: ClientAction, payload: &[u8]) {
    let frame = encode(&action, payload).unwrap();
    ws.send(Message::Binary(frame)).await.unwrap();
}

/// Next decoded frame, or `None` once the connection is closed.
async fn recv(ws: &mut ClientWs) -> Option<ClientFrame> {
    loop {
        let msg = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame");
        match msg {
            Some(Ok(Message::Binary(data))) => return Some(decode(data).unwrap()),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

/// Collect frames up to and including the first `action`.
async fn recv_until(ws: &mut ClientWs, action: ClientAction) -> Vec<ClientFrame> {
    let mut frames = Vec::new();
    while let Some(frame) = recv(ws).await {
        let done = frame.action == action;
        frames.push(frame);
        if done {
            return frames;
        }
    }
    panic!("connection closed before {action}: {frames:?}");
}

/// Collect frames until the connection closes.
async fn recv_all(ws: &mut ClientWs) -> Vec<ClientFrame> {
    let mut frames = Vec::new();
    while let Some(frame) = recv(ws).await {
        frames.push(frame);
    }
    frames
}

fn actions(frames: &[ClientFrame]) -> Vec<ClientAction> {
    frames.iter().map(|f| f.action.clone()).collect()
}

fn text(frame: &ClientFrame) -> &str {
    std::str::from_utf8(&frame.payload).unwrap()
}

async fn started_session(mock: &FunAsrMock, wakewords: &str) -> ClientWs {
    let addr = start_gateway(test_config(&mock.url, wakewords)).await;
    let mut ws = connect(addr, "").await;
    let frames = recv_until(&mut ws, ClientAction::EngineStarted).await;
    assert_eq!(
        actions(&frames),
        vec![ClientAction::EngineInitializing, ClientAction::EngineStarted]
    );
    ws
}

#[tokio::test]
async fn test_two_pass_flow_detects_wake_phrase_on_partial() {
    let mock = FunAsrMock::start(FunAsrScript {
        replies: vec![
            vec![json!({"mode": "2pass-online", "text": "he", "is_final": false})],
            vec![json!({"mode": "2pass-online", "text": "llo wake up", "is_final": false})],
            vec![json!({"mode": "2pass-offline", "text": " now", "is_final": true})],
        ],
        ..Default::default()
    })
    .await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::EnginePartialInput, &[1u8; 640]).await;
    send(&mut ws, ClientAction::EnginePartialInput, &[2u8; 640]).await;
    send(&mut ws, ClientAction::EngineFinalInput, &[3u8; 320]).await;

    let frames = recv_until(&mut ws, ClientAction::EngineFinalOutput).await;
    assert_eq!(
        actions(&frames),
        vec![
            ClientAction::EnginePartialOutput,
            ClientAction::WakewordDetected,
            ClientAction::EnginePartialOutput,
            ClientAction::EngineFinalOutput,
        ]
    );
    assert_eq!(text(&frames[0]), "he");
    assert_eq!(text(&frames[2]), "hello wake up");
    // Online text is discarded at the correction pass
    assert_eq!(text(&frames[3]), " now");

    let detected: Value = serde_json::from_slice(&frames[1].payload).unwrap();
    assert_eq!(
        detected,
        json!({"text": "hello wake up", "wakeword": true, "phrase": "wake up"})
    );

    // Handshake carries the session settings and the hotwords
    let init = mock.state.init_message().unwrap();
    assert_eq!(init["mode"], "2pass");
    assert_eq!(init["hotwords"], "wake up");
    assert_eq!(init["chunk_size"], json!([5, 10, 5]));
    assert_eq!(init["wav_name"], "wakeword");
    assert_eq!(init["is_speaking"], true);
    assert_eq!(init["itn"], true);
    assert_eq!(
        mock.state.subprotocols.lock().unwrap().clone(),
        vec![Some("binary".to_string())]
    );

    // The final result is followed by an utterance reset
    assert!(
        mock.wait_until(|state| {
            let received = state.received();
            let tail: Vec<_> = received.iter().rev().take(2).rev().collect();
            tail.len() == 2
                && tail[0].is_speaking() == Some(false)
                && tail[1].is_speaking() == Some(true)
        })
        .await
    );
}

#[tokio::test]
async fn test_accumulator_resets_between_utterances() {
    let mock = FunAsrMock::start(FunAsrScript {
        replies: vec![
            vec![json!({"mode": "online", "text": "first"})],
            vec![json!({"mode": "offline", "text": " utterance"})],
            vec![json!({"mode": "online", "text": "second"})],
        ],
        ..Default::default()
    })
    .await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::EnginePartialInput, &[0u8; 64]).await;
    send(&mut ws, ClientAction::EngineFinalInput, &[0u8; 64]).await;
    let frames = recv_until(&mut ws, ClientAction::EngineFinalOutput).await;
    assert_eq!(text(frames.last().unwrap()), "first utterance");

    send(&mut ws, ClientAction::EnginePartialInput, &[0u8; 64]).await;
    let frames = recv_until(&mut ws, ClientAction::EnginePartialOutput).await;
    assert_eq!(text(frames.last().unwrap()), "second");
}

#[tokio::test]
async fn test_engine_stop_closes_upstream_without_error() {
    let mock = FunAsrMock::start(FunAsrScript::default()).await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::EnginePartialInput, &[0u8; 64]).await;
    send(&mut ws, ClientAction::EngineStop, &[]).await;

    let frames = recv_all(&mut ws).await;
    assert_eq!(actions(&frames), vec![ClientAction::EngineStopped]);
    assert!(
        mock.wait_until(|state| state.disconnected.load(Ordering::SeqCst))
            .await
    );
}

#[tokio::test]
async fn test_upstream_unreachable_reports_single_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let addr = start_gateway(test_config(&format!("ws://127.0.0.1:{port}"), "wake up")).await;
    let mut ws = connect(addr, "").await;

    let frames = recv_all(&mut ws).await;
    assert_eq!(
        actions(&frames),
        vec![ClientAction::EngineInitializing, ClientAction::Error]
    );
    assert!(text(&frames[1]).contains("Upstream unreachable"));
}

#[tokio::test]
async fn test_ping_pong() {
    let mock = FunAsrMock::start(FunAsrScript::default()).await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::Ping, &[]).await;
    let frame = recv(&mut ws).await.unwrap();
    assert_eq!(frame.action, ClientAction::Pong);
    assert!(frame.payload.is_empty());

    // Liveness traffic never reaches the recognizer
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(mock.state.received().len(), 1);
}

#[tokio::test]
async fn test_duplicate_start_is_protocol_violation() {
    let mock = FunAsrMock::start(FunAsrScript::default()).await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::EngineStart, &[]).await;

    let frames = recv_all(&mut ws).await;
    assert_eq!(actions(&frames), vec![ClientAction::Error]);
    assert!(text(&frames[0]).contains("already started"));
    assert!(
        mock.wait_until(|state| state.disconnected.load(Ordering::SeqCst))
            .await
    );
}

#[tokio::test]
async fn test_unknown_action_is_reported() {
    let mock = FunAsrMock::start(FunAsrScript::default()).await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::Unknown("REWIND".to_string()), &[]).await;

    let frames = recv_all(&mut ws).await;
    assert_eq!(actions(&frames), vec![ClientAction::Error]);
    assert!(text(&frames[0]).contains("REWIND"));
}

#[tokio::test]
async fn test_final_input_ends_utterance_before_audio() {
    let mock = FunAsrMock::start(FunAsrScript::default()).await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::EngineFinalInput, &[9u8; 32]).await;

    assert!(mock.wait_until(|state| state.received().len() >= 3).await);
    let received = mock.state.received();
    assert_eq!(received[1].is_speaking(), Some(false));
    assert_eq!(received[2], Received::Audio(vec![9u8; 32]));
}

#[tokio::test]
async fn test_results_without_mode_are_ignored() {
    let mock = FunAsrMock::start(FunAsrScript {
        replies: vec![vec![
            json!({"text": "no mode"}),
            json!({"mode": 3, "text": "numeric mode"}),
            json!({"mode": "online", "text": "hi"}),
        ]],
        ..Default::default()
    })
    .await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::EnginePartialInput, &[0u8; 64]).await;
    let frame = recv(&mut ws).await.unwrap();
    assert_eq!(frame.action, ClientAction::EnginePartialOutput);
    assert_eq!(text(&frame), "hi");
}

#[tokio::test]
async fn test_runtime_wakewords_replace_configured() {
    let mock = FunAsrMock::start(FunAsrScript {
        replies: vec![vec![json!({"mode": "online", "text": "ok computer"})]],
        ..Default::default()
    })
    .await;
    let addr = start_gateway(test_config(&mock.url, "wake up")).await;
    let mut ws = connect(addr, "?wakewords=ok%20computer,hey&mode=online&sensitivity=0.3").await;
    recv_until(&mut ws, ClientAction::EngineStarted).await;

    send(&mut ws, ClientAction::EnginePartialInput, &[0u8; 64]).await;
    let frames = recv_until(&mut ws, ClientAction::EnginePartialOutput).await;
    assert_eq!(
        actions(&frames),
        vec![
            ClientAction::WakewordDetected,
            ClientAction::EnginePartialOutput
        ]
    );

    let init = mock.state.init_message().unwrap();
    assert_eq!(init["mode"], "online");
    assert_eq!(init["hotwords"], "ok computer hey");
}

#[tokio::test]
async fn test_upstream_close_ends_session_quietly() {
    let mock = FunAsrMock::start(FunAsrScript {
        close_after_init: true,
        ..Default::default()
    })
    .await;
    let mut ws = started_session(&mock, "wake up").await;

    let frames = recv_all(&mut ws).await;
    assert!(
        !actions(&frames).contains(&ClientAction::Error),
        "unexpected frames: {frames:?}"
    );
}

#[tokio::test]
async fn test_every_matching_output_raises_wake_event() {
    let mock = FunAsrMock::start(FunAsrScript {
        replies: vec![
            vec![json!({"mode": "online", "text": "wake up"})],
            vec![json!({"mode": "online", "text": " now"})],
            vec![json!({"mode": "offline", "text": " please"})],
        ],
        ..Default::default()
    })
    .await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::EnginePartialInput, &[0u8; 64]).await;
    send(&mut ws, ClientAction::EnginePartialInput, &[0u8; 64]).await;
    send(&mut ws, ClientAction::EnginePartialInput, &[0u8; 64]).await;

    let frames = recv_until(&mut ws, ClientAction::EngineFinalOutput).await;
    assert_eq!(
        actions(&frames),
        vec![
            ClientAction::WakewordDetected,
            ClientAction::EnginePartialOutput,
            ClientAction::WakewordDetected,
            ClientAction::EnginePartialOutput,
            ClientAction::WakewordDetected,
            ClientAction::EngineFinalOutput,
        ]
    );

    let texts: Vec<String> = frames
        .iter()
        .filter(|f| f.action == ClientAction::WakewordDetected)
        .map(|f| {
            let detected: Value = serde_json::from_slice(&f.payload).unwrap();
            detected["text"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(texts, vec!["wake up", "wake up now", "wake up now please"]);
}

#[tokio::test]
async fn test_invalid_recognizer_frame_reports_single_error() {
    let mock = FunAsrMock::start(FunAsrScript {
        replies: vec![vec![json!("not json at all")]],
        ..Default::default()
    })
    .await;
    let mut ws = started_session(&mock, "wake up").await;

    send(&mut ws, ClientAction::EnginePartialInput, &[0u8; 64]).await;

    let frames = recv_all(&mut ws).await;
    assert_eq!(actions(&frames), vec![ClientAction::Error]);
    assert!(text(&frames[0]).contains("Serialization error"));
    assert!(
        mock.wait_until(|state| state.disconnected.load(Ordering::SeqCst))
            .await
    );
}

#[tokio::test]
async fn test_malformed_client_frame_reports_single_error() {
    let mock = FunAsrMock::start(FunAsrScript::default()).await;
    let mut ws = started_session(&mock, "wake up").await;

    ws.send(Message::Binary(vec![1u8, 2, 3].into())).await.unwrap();

    let frames = recv_all(&mut ws).await;
    assert_eq!(actions(&frames), vec![ClientAction::Error]);
    assert!(text(&frames[0]).contains("Malformed frame"));
    assert!(
        mock.wait_until(|state| state.disconnected.load(Ordering::SeqCst))
            .await
    );
}

#[tokio::test]
async fn test_client_text_frame_reports_single_error() {
    let mock = FunAsrMock::start(FunAsrScript::default()).await;
    let mut ws = started_session(&mock, "wake up").await;

    ws.send(Message::Text("ENGINE_STOP".into())).await.unwrap();

    let frames = recv_all(&mut ws).await;
    assert_eq!(actions(&frames), vec![ClientAction::Error]);
    assert!(text(&frames[0]).contains("text frames are not supported"));
    assert!(
        mock.wait_until(|state| state.disconnected.load(Ordering::SeqCst))
            .await
    );
}
