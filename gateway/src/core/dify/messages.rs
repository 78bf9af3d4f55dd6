//! Request and response bodies for the Dify files and workflows APIs.

use serde::{Deserialize, Serialize};

/// Response of `POST /files/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    /// Identifier to reference the file in a workflow run
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Body of `POST /workflows/run`.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRunRequest {
    pub user: String,
    pub inputs: WorkflowInputs,
    pub response_mode: &'static str,
}

/// Workflow inputs. The transcription workflow takes the audio file under
/// the `video` input variable.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowInputs {
    pub video: FileReference,
}

/// Reference to a previously uploaded file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReference {
    #[serde(rename = "type")]
    pub file_type: &'static str,
    pub transfer_method: &'static str,
    pub upload_file_id: String,
}

impl WorkflowRunRequest {
    /// Blocking run over an uploaded audio file.
    pub fn for_audio(user: &str, upload_file_id: String) -> Self {
        Self {
            user: user.to_string(),
            inputs: WorkflowInputs {
                video: FileReference {
                    file_type: "audio",
                    transfer_method: "local_file",
                    upload_file_id,
                },
            },
            response_mode: "blocking",
        }
    }
}

/// Response of a blocking `POST /workflows/run`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowRunResponse {
    #[serde(default)]
    pub workflow_run_id: Option<String>,
    #[serde(default)]
    pub data: WorkflowRunData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowRunData {
    /// `running`, `succeeded`, `failed` or `stopped`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub outputs: Option<serde_json::Map<String, serde_json::Value>>,
}
