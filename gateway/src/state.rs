//! Shared application state.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::dify::DifyAsr;

/// State shared by all request handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Dify transcription client, present when Dify is configured
    pub dify: Option<DifyAsr>,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let dify = match config.dify.clone() {
            Some(dify_config) => match DifyAsr::new(dify_config) {
                Ok(client) => {
                    info!("Dify transcription enabled");
                    Some(client)
                }
                Err(e) => {
                    warn!("Dify transcription disabled: {}", e);
                    None
                }
            },
            None => None,
        };

        info!(
            funasr_url = %config.funasr_url,
            mode = %config.wakeword_mode,
            wakewords = ?config.wakewords,
            "Wake-word relay configured"
        );

        Arc::new(Self { config, dify })
    }
}
