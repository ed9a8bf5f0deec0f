use crate::config::ClientConfig;
use crate::{Error, ErrorContext, Result};
use std::env;
use std::time::Duration;
use reqwest::{Certificate, Proxy, RequestBuilder};
use tracing::debug;
use uuid::Uuid;

/// Status and body of a finished HTTP exchange.
///
/// The body is read eagerly; every payload of the service is small JSON except
/// the recognition result, which is needed as text anyway.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .pool_max_idle_per_host(
                env::var("SALUTE_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(8),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("SALUTE_HTTP_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )));

        if let Some(path) = &config.ca_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                Error::configuration_with_context(
                    format!("Failed to read CA certificate: {}", e),
                    ErrorContext::new()
                        .with_field_path("ca_cert_path")
                        .with_details(path.display().to_string()),
                )
            })?;
            let cert = Certificate::from_pem(&pem).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid PEM certificate: {}", e),
                    ErrorContext::new().with_field_path("ca_cert_path"),
                )
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid proxy URL: {}", e),
                    ErrorContext::new().with_field_path("proxy_url"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Absolute URL of a service method such as `data:upload`.
    ///
    /// Plain concatenation: `Url::join` would read `data:upload` as a URL with
    /// the `data` scheme.
    pub fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            method.trim_start_matches('/')
        )
    }

    /// Send an authorized request and read the whole body.
    pub async fn execute(&self, request: RequestBuilder, token: &str) -> Result<HttpResponse> {
        let request_id = Uuid::new_v4().to_string();
        let response = request
            .bearer_auth(token)
            .header("X-Request-ID", &request_id)
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        Self::read(response, &request_id).await
    }

    /// Read status and body of an already sent request.
    pub async fn read(response: reqwest::Response, request_id: &str) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        debug!(request_id, status, bytes = body.len(), "response received");
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
