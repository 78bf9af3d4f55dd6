//! Merging environment variables with YAML overrides.

use std::path::PathBuf;

use super::env::EnvConfig;
use super::yaml::YamlConfig;
use super::{
    DEFAULT_FUNASR_URL, DEFAULT_HOST, DEFAULT_MODE, DEFAULT_PORT, DEFAULT_SENSITIVITY,
    DEFAULT_WAV_NAME, ServerConfig, TlsConfig,
};
use crate::core::dify::DifyConfig;
use crate::core::wakeword::{DEFAULT_SUBPROTOCOL, WakePhraseSet};

const DEFAULT_DIFY_USERNAME: &str = "wakeword-gateway";

/// Build the configuration: defaults, then environment, then YAML.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let env = EnvConfig::load()?;
    let yaml = yaml.unwrap_or_default();

    let server = yaml.server.unwrap_or_default();
    let tls_yaml = server.tls.unwrap_or_default();
    let funasr = yaml.funasr.unwrap_or_default();
    let wakeword = yaml.wakeword.unwrap_or_default();
    let dify = yaml.dify.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();

    let host = server
        .host
        .or(env.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.or(env.port).unwrap_or(DEFAULT_PORT);

    let tls_enabled = tls_yaml.enabled.or(env.tls_enabled).unwrap_or(false);
    let tls = if tls_enabled {
        Some(TlsConfig {
            cert_path: PathBuf::from(tls_yaml.cert_path.or(env.tls_cert_path).unwrap_or_default()),
            key_path: PathBuf::from(tls_yaml.key_path.or(env.tls_key_path).unwrap_or_default()),
        })
    } else {
        None
    };

    let funasr_url = funasr
        .url
        .or(env.funasr_url)
        .unwrap_or_else(|| DEFAULT_FUNASR_URL.to_string());
    let funasr_subprotocol = match funasr.subprotocol.or(env.funasr_subprotocol) {
        Some(protocol) if protocol.trim().is_empty() => None,
        Some(protocol) => Some(protocol.trim().to_string()),
        None => Some(DEFAULT_SUBPROTOCOL.to_string()),
    };

    let wakewords = match wakeword.wakewords {
        Some(list) => WakePhraseSet::from_phrases(list.into_phrases()),
        None => env
            .wakewords
            .as_deref()
            .map(WakePhraseSet::parse)
            .unwrap_or_default(),
    };

    let dify_api_server = dify.api_server.or(env.dify_api_server);
    let dify_config = dify_api_server.map(|api_server| DifyConfig {
        api_server,
        api_key: dify.api_key.or(env.dify_api_key).unwrap_or_default(),
        username: dify
            .username
            .or(env.dify_username)
            .unwrap_or_else(|| DEFAULT_DIFY_USERNAME.to_string()),
    });

    Ok(ServerConfig {
        host,
        port,
        tls,
        cors_allowed_origins: security.cors_allowed_origins.or(env.cors_allowed_origins),
        funasr_url,
        funasr_subprotocol,
        wakeword_mode: wakeword
            .mode
            .or(env.wakeword_mode)
            .unwrap_or_else(|| DEFAULT_MODE.to_string()),
        wakewords,
        wakeword_sensitivity: wakeword
            .sensitivity
            .or(env.wakeword_sensitivity)
            .unwrap_or(DEFAULT_SENSITIVITY),
        wakeword_wav_name: wakeword
            .wav_name
            .or(env.wakeword_wav_name)
            .unwrap_or_else(|| DEFAULT_WAV_NAME.to_string()),
        dify: dify_config,
    })
}
