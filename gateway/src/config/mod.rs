//! Configuration module for the wake-word gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use wakeword_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use crate::core::dify::DifyConfig;
use crate::core::wakeword::WakePhraseSet;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::{PhraseList, YamlConfig};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FUNASR_URL: &str = "ws://127.0.0.1:10095";
pub const DEFAULT_MODE: &str = "2pass";
pub const DEFAULT_SENSITIVITY: f32 = 0.5;
pub const DEFAULT_WAV_NAME: &str = "wakeword";

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Secrets live in [`DifyConfig`], which zeroizes its API key on drop.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsConfig>,
    /// CORS allowed origins (comma-separated list or "*"); `None` means same-origin only
    pub cors_allowed_origins: Option<String>,

    /// Streaming recognizer endpoint (`ws://` or `wss://`)
    pub funasr_url: String,
    /// WebSocket subprotocol requested from the recognizer
    pub funasr_subprotocol: Option<String>,

    /// Default recognition mode (`online`, `offline` or `2pass`)
    pub wakeword_mode: String,
    /// Default wake phrases; a session may replace them
    pub wakewords: WakePhraseSet,
    /// Reserved detection sensitivity in `[0, 1]`
    pub wakeword_sensitivity: f32,
    /// Session tag sent to the recognizer as `wav_name`
    pub wakeword_wav_name: String,

    /// Dify workflow transcription, enabled when configured
    pub dify: Option<DifyConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// The .env file is loaded in main.rs at startup, so its values are already
    /// visible as environment variables here.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or validation fails.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_funasr_url(&self.funasr_url)?;
        validation::validate_mode(&self.wakeword_mode)?;
        validation::validate_sensitivity(self.wakeword_sensitivity)?;
        validation::validate_dify(&self.dify)?;
        validation::validate_tls(&self.tls)?;
        Ok(())
    }

    /// Get the server address as a string in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Check if the Dify transcription endpoint is configured
    pub fn has_dify(&self) -> bool {
        self.dify.is_some()
    }
}
