//! Dify transcription client.

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroize;

use super::messages::{UploadResponse, WorkflowRunRequest, WorkflowRunResponse};

/// Request timeout; a blocking workflow run includes the transcription itself.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = concat!("wakeword-gateway/", env!("CARGO_PKG_VERSION"));

/// Errors from the Dify transcription flow.
#[derive(Debug, Error)]
pub enum DifyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("File upload failed ({status}): {body}")]
    UploadFailed { status: u16, body: String },

    #[error("Upload response has no file id")]
    MissingFileId,

    #[error("Workflow request failed ({status}): {body}")]
    WorkflowFailed { status: u16, body: String },

    #[error("Workflow run failed: {0}")]
    WorkflowError(String),

    #[error("Workflow returned no text output: {0}")]
    MissingText(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type DifyResult<T> = Result<T, DifyError>;

/// Connection settings for a Dify app.
#[derive(Clone, PartialEq, Eq)]
pub struct DifyConfig {
    /// API base, e.g. `https://api.dify.ai/v1`
    pub api_server: String,
    pub api_key: String,
    /// End-user identifier reported to Dify
    pub username: String,
}

impl std::fmt::Debug for DifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DifyConfig")
            .field("api_server", &self.api_server)
            .field("api_key", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

impl Drop for DifyConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

/// Speech-to-text through a Dify workflow.
#[derive(Debug, Clone)]
pub struct DifyAsr {
    config: DifyConfig,
    http_client: Client,
}

impl DifyAsr {
    pub fn new(config: DifyConfig) -> DifyResult<Self> {
        if config.api_key.is_empty() {
            return Err(DifyError::Configuration("Dify API key is empty".to_string()));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DifyError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_server.trim_end_matches('/'), path)
    }

    /// Upload `audio` and run the transcription workflow over it.
    pub async fn transcribe(&self, audio: Bytes, content_type: &str) -> DifyResult<String> {
        let file_id = self.upload(audio, content_type).await?;
        self.run_workflow(file_id).await
    }

    async fn upload(&self, audio: Bytes, content_type: &str) -> DifyResult<String> {
        let file_part = Part::bytes(audio.to_vec())
            .file_name("file")
            .mime_str(content_type)
            .map_err(|e| DifyError::Configuration(format!("Invalid MIME type: {e}")))?;

        let form = Form::new()
            .part("file", file_part)
            .text("user", self.config.username.clone());

        let response = self
            .http_client
            .post(self.endpoint("/files/upload"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DifyError::Network(format!("Upload request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DifyError::Network(format!("Failed to read upload response: {e}")))?;
        debug!("Dify upload response ({}): {}", status, body);

        if status.as_u16() != 200 && status.as_u16() != 201 {
            return Err(DifyError::UploadFailed {
                status: status.as_u16(),
                body,
            });
        }

        let upload: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| DifyError::InvalidResponse(format!("Upload response: {e}")))?;
        upload
            .id
            .filter(|id| !id.is_empty())
            .ok_or(DifyError::MissingFileId)
    }

    async fn run_workflow(&self, file_id: String) -> DifyResult<String> {
        let request = WorkflowRunRequest::for_audio(&self.config.username, file_id);
        debug!(
            "Dify workflow request: {}",
            serde_json::to_string(&request).unwrap_or_default()
        );

        let response = self
            .http_client
            .post(self.endpoint("/workflows/run"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DifyError::Network(format!("Workflow request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DifyError::Network(format!("Failed to read workflow response: {e}")))?;
        debug!("Dify workflow response ({}): {}", status, body);

        if status != StatusCode::OK {
            return Err(DifyError::WorkflowFailed {
                status: status.as_u16(),
                body,
            });
        }

        let run: WorkflowRunResponse = serde_json::from_str(&body)
            .map_err(|e| DifyError::InvalidResponse(format!("Workflow response: {e}")))?;

        if run.data.status.as_deref() == Some("failed") {
            return Err(DifyError::WorkflowError(
                run.data.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let outputs = run.data.outputs.unwrap_or_default();
        if let Some(serde_json::Value::String(text)) = outputs.get("text") {
            return Ok(text.clone());
        }
        Err(DifyError::MissingText(
            serde_json::Value::Object(outputs).to_string(),
        ))
    }
}
