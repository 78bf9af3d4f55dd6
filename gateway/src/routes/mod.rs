use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub mod api;
pub mod wakeword;

/// All routes with state applied. Cross-cutting layers (CORS, security
/// headers) are added by the binary.
pub fn create_router(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(wakeword::create_wakeword_router())
        .with_state(state)
}
