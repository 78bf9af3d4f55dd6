use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values given here
/// override the environment.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///   tls:
///     enabled: false
///
/// funasr:
///   url: "ws://127.0.0.1:10095"
///   subprotocol: "binary"
///
/// wakeword:
///   mode: "2pass"
///   wakewords: ["hey robot", "wake up"]
///   sensitivity: 0.5
///   wav_name: "wakeword"
///
/// dify:
///   api_server: "https://api.dify.ai/v1"
///   api_key: "app-..."
///   username: "wakeword-gateway"
///
/// security:
///   cors_allowed_origins: "https://example.com"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub funasr: Option<FunAsrYaml>,
    pub wakeword: Option<WakewordYaml>,
    pub dify: Option<DifyYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Recognition service connection
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FunAsrYaml {
    pub url: Option<String>,
    /// WebSocket subprotocol; an empty string disables it
    pub subprotocol: Option<String>,
}

/// Wake phrases as a YAML list or a comma-separated string
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PhraseList {
    List(Vec<String>),
    Csv(String),
}

impl PhraseList {
    pub fn into_phrases(self) -> Vec<String> {
        match self {
            Self::List(list) => list,
            Self::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        }
    }
}

/// Session defaults
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WakewordYaml {
    pub mode: Option<String>,
    pub wakewords: Option<PhraseList>,
    pub sensitivity: Option<f32>,
    pub wav_name: Option<String>,
}

/// Dify workflow transcription
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DifyYaml {
    pub api_server: Option<String>,
    pub api_key: Option<String>,
    pub username: Option<String>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
}

impl YamlConfig {
    /// Load a YAML configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
