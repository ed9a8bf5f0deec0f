//! 客户端配置：默认值、YAML 文件与环境变量覆盖。
//!
//! Client configuration.
//!
//! Resolution order (later wins): built-in defaults, an optional YAML file,
//! environment variables, explicit builder setters.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://smartspeech.sber.ru/rest/v1/";
pub const DEFAULT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_SCOPE: &str = "SALUTE_SPEECH_PERS";

/// Connection and authentication settings shared by every request of a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// REST root of the recognition service; endpoint names are appended to it.
    pub base_url: String,
    /// OAuth endpoint issuing bearer tokens.
    pub auth_url: String,
    /// OAuth scope (`SALUTE_SPEECH_PERS`, `SALUTE_SPEECH_CORP`, ...).
    pub scope: String,
    /// A cached token is refreshed once its expiry is closer than this.
    pub token_safety_margin_secs: u64,
    pub http_timeout_secs: u64,
    /// Extra PEM root certificate(s), e.g. the Russian Trusted Root CA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            token_safety_margin_secs: 60,
            http_timeout_secs: 60,
            ca_cert_path: None,
            proxy_url: None,
        }
    }
}

impl ClientConfig {
    /// Load a YAML file; missing keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&raw).map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to parse config file: {}", e),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("config_loader"),
            )
        })
    }

    /// Apply `SALUTE_SPEECH_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("SALUTE_SPEECH_BASE_URL") {
            self.base_url = v;
        }
        if let Ok(v) = std::env::var("SALUTE_SPEECH_AUTH_URL") {
            self.auth_url = v;
        }
        if let Ok(v) = std::env::var("SALUTE_SPEECH_SCOPE") {
            self.scope = v;
        }
        if let Ok(v) = std::env::var("SALUTE_SPEECH_CA_CERT") {
            self.ca_cert_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("SALUTE_SPEECH_PROXY_URL") {
            self.proxy_url = Some(v);
        }
        if let Some(secs) = std::env::var("SALUTE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.http_timeout_secs = secs;
        }
        self
    }

    pub fn token_safety_margin(&self) -> Duration {
        Duration::from_secs(self.token_safety_margin_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Checks URLs and the scope before a client is built.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("base_url", &self.base_url), ("auth_url", &self.auth_url)] {
            let parsed = url::Url::parse(value).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid URL '{}': {}", value, e),
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_source("config_validator"),
                )
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::configuration_with_context(
                    format!("Unsupported URL scheme '{}'", parsed.scheme()),
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_source("config_validator"),
                ));
            }
        }
        if self.scope.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "OAuth scope must not be empty",
                ErrorContext::new()
                    .with_field_path("scope")
                    .with_source("config_validator"),
            ));
        }
        Ok(())
    }
}
