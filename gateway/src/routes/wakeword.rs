//! Wake-word WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::wakeword::wakeword_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the wake-word WebSocket router
///
/// # Endpoint
///
/// `GET /wakeword` - WebSocket upgrade for wake-word spotting
///
/// # Query parameters
///
/// - `mode`: recognition mode for this session (`online`, `offline`, `2pass`)
/// - `wakewords`: comma-separated wake phrases replacing the configured ones
/// - `sensitivity`: reserved, in `[0, 1]`
///
/// # Protocol
///
/// Binary frames only, each an action tag plus payload. After the upgrade the
/// server sends `ENGINE_INITIALIZING` and, once the recognizer is connected,
/// `ENGINE_STARTED`; the client then streams `ENGINE_PARTIAL_INPUT` audio.
pub fn create_wakeword_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/wakeword", get(wakeword_handler))
        .layer(TraceLayer::new_for_http())
}
