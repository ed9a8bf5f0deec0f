use super::core::SaluteSpeechClient;
use crate::auth::{ClientCredentials, TokenManager};
use crate::config::ClientConfig;
use crate::transport::HttpTransport;
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`SaluteSpeechClient`].
///
/// Without an explicit [`config`](Self::config) the defaults are used with
/// `SALUTE_SPEECH_*` environment overrides applied. Setters always win.
#[derive(Debug, Default)]
pub struct SaluteSpeechClientBuilder {
    config: Option<ClientConfig>,
    credentials: Option<ClientCredentials>,
    base_url: Option<String>,
    auth_url: Option<String>,
    scope: Option<String>,
    token_safety_margin: Option<Duration>,
    http_timeout: Option<Duration>,
    ca_cert_path: Option<PathBuf>,
    proxy_url: Option<String>,
}

impl SaluteSpeechClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a complete configuration (e.g. loaded with
    /// [`ClientConfig::from_yaml_file`]) instead of defaults plus environment.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Credentials to use instead of the keyring / `SBER_SPEECH_API_KEY` lookup.
    pub fn credentials(mut self, credentials: ClientCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the REST root (primarily for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn token_safety_margin(mut self, margin: Duration) -> Self {
        self.token_safety_margin = Some(margin);
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Trust an extra PEM root certificate, such as the Russian Trusted Root CA.
    pub fn ca_cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<SaluteSpeechClient> {
        let mut config = self
            .config
            .unwrap_or_else(|| ClientConfig::default().with_env_overrides());
        if let Some(v) = self.base_url {
            config.base_url = v;
        }
        if let Some(v) = self.auth_url {
            config.auth_url = v;
        }
        if let Some(v) = self.scope {
            config.scope = v;
        }
        if let Some(v) = self.token_safety_margin {
            config.token_safety_margin_secs = v.as_secs();
        }
        if let Some(v) = self.http_timeout {
            config.http_timeout_secs = v.as_secs().max(1);
        }
        if let Some(v) = self.ca_cert_path {
            config.ca_cert_path = Some(v);
        }
        if let Some(v) = self.proxy_url {
            config.proxy_url = Some(v);
        }
        config.validate()?;

        let credentials = match self.credentials {
            Some(c) => c,
            None => ClientCredentials::from_env()?,
        };

        let transport = HttpTransport::new(&config)?;
        let tokens = TokenManager::new(transport.client().clone(), &config, credentials);

        Ok(SaluteSpeechClient {
            transport: Arc::new(transport),
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        })
    }
}
