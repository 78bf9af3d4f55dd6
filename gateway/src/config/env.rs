//! Environment variable loading.

use std::env;
use std::str::FromStr;

/// Values read from the process environment. Unset or blank variables are `None`.
#[derive(Debug, Clone, Default)]
pub(super) struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_enabled: Option<bool>,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    pub cors_allowed_origins: Option<String>,
    pub funasr_url: Option<String>,
    pub funasr_subprotocol: Option<String>,
    pub wakeword_mode: Option<String>,
    pub wakewords: Option<String>,
    pub wakeword_sensitivity: Option<f32>,
    pub wakeword_wav_name: Option<String>,
    pub dify_api_server: Option<String>,
    pub dify_api_key: Option<String>,
    pub dify_username: Option<String>,
}

impl EnvConfig {
    pub(super) fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            host: string_var("HOST"),
            port: parsed_var("PORT")?,
            tls_enabled: bool_var("TLS_ENABLED")?,
            tls_cert_path: string_var("TLS_CERT_PATH"),
            tls_key_path: string_var("TLS_KEY_PATH"),
            cors_allowed_origins: string_var("CORS_ALLOWED_ORIGINS"),
            funasr_url: string_var("FUNASR_URL"),
            // Kept verbatim so that an explicitly empty value can disable the subprotocol
            funasr_subprotocol: env::var("FUNASR_SUBPROTOCOL").ok(),
            wakeword_mode: string_var("WAKEWORD_MODE"),
            wakewords: string_var("WAKEWORDS"),
            wakeword_sensitivity: parsed_var("WAKEWORD_SENSITIVITY")?,
            wakeword_wav_name: string_var("WAKEWORD_WAV_NAME"),
            dify_api_server: string_var("DIFY_API_SERVER"),
            dify_api_key: string_var("DIFY_API_KEY"),
            dify_username: string_var("DIFY_USERNAME"),
        })
    }
}

fn string_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match string_var(name) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name}: '{value}' ({e})").into()),
        None => Ok(None),
    }
}

fn bool_var(name: &str) -> Result<Option<bool>, Box<dyn std::error::Error>> {
    match string_var(name).map(|v| v.to_ascii_lowercase()) {
        Some(value) => match value.as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(format!("Invalid boolean for {name}: '{value}'").into()),
        },
        None => Ok(None),
    }
}
