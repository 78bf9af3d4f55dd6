//! Dify workflow transcription.
//!
//! Non-streaming speech-to-text through a Dify workflow: the audio file is
//! uploaded first, then a blocking workflow run is started with a reference
//! to the uploaded file and the workflow's `text` output is returned.

mod client;
mod messages;

pub use client::{DifyAsr, DifyConfig, DifyError, DifyResult};
pub use messages::{UploadResponse, WorkflowRunRequest, WorkflowRunResponse};
