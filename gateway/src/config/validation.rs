//! Configuration validation.

use url::Url;

use super::TlsConfig;
use crate::core::dify::DifyConfig;

/// The recognizer URL must be a WebSocket URL.
pub(super) fn validate_funasr_url(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Url::parse(url).map_err(|e| format!("Invalid FUNASR_URL '{url}': {e}"))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        scheme => Err(format!("FUNASR_URL must use ws:// or wss://, got '{scheme}://'").into()),
    }
}

pub(super) fn validate_sensitivity(sensitivity: f32) -> Result<(), Box<dyn std::error::Error>> {
    if (0.0..=1.0).contains(&sensitivity) {
        Ok(())
    } else {
        Err(format!("WAKEWORD_SENSITIVITY must be between 0 and 1, got {sensitivity}").into())
    }
}

pub(super) fn validate_mode(mode: &str) -> Result<(), Box<dyn std::error::Error>> {
    if mode.trim().is_empty() {
        return Err("WAKEWORD_MODE must not be empty".into());
    }
    Ok(())
}

pub(super) fn validate_dify(dify: &Option<DifyConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(dify) = dify else {
        return Ok(());
    };

    let parsed = Url::parse(&dify.api_server)
        .map_err(|e| format!("Invalid DIFY_API_SERVER '{}': {e}", dify.api_server))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!(
            "DIFY_API_SERVER must use http:// or https://, got '{}://'",
            parsed.scheme()
        )
        .into());
    }
    if dify.api_key.is_empty() {
        return Err("DIFY_API_KEY is required when DIFY_API_SERVER is set".into());
    }
    Ok(())
}

pub(super) fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(tls) = tls else {
        return Ok(());
    };
    if tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty() {
        return Err("TLS is enabled but TLS_CERT_PATH or TLS_KEY_PATH is missing".into());
    }
    Ok(())
}
