//! One-shot transcription through a Dify workflow.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::state::AppState;

/// Content type assumed when the request does not carry one
const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/wav";

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// Transcribe the raw audio request body.
///
/// # Returns
/// * `200` with `{"text": ...}`
/// * `400` when the body is empty
/// * `502` when Dify fails
/// * `503` when Dify is not configured
pub async fn dify_transcribe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(dify) = &state.dify else {
        error!("Dify transcription requested but Dify is not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Dify transcription not configured"})),
        )
            .into_response();
    };

    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Request body must contain audio"})),
        )
            .into_response();
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_AUDIO_CONTENT_TYPE)
        .to_string();

    info!(
        bytes = body.len(),
        content_type = %content_type,
        "Dify transcription requested"
    );

    match dify.transcribe(body, &content_type).await {
        Ok(text) => (StatusCode::OK, Json(TranscribeResponse { text })).into_response(),
        Err(e) => {
            error!("Dify transcription failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}
