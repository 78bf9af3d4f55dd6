use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, transcribe};
use crate::state::AppState;
use std::sync::Arc;

/// Create the REST API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/asr/dify", post(transcribe::dify_transcribe))
        .layer(TraceLayer::new_for_http())
}
