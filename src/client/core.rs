use super::builder::SaluteSpeechClientBuilder;
use super::response::Envelope;
use super::transcriptions::Transcriptions;
use crate::audio::AudioDescriptor;
use crate::auth::TokenManager;
use crate::config::ClientConfig;
use crate::recognition::{RecognitionTask, SpeechRecognitionConfig};
use crate::transport::{HttpResponse, HttpTransport};
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

const UPLOAD: &str = "data:upload";
const RECOGNIZE: &str = "speech:async_recognize";
const TASK_GET: &str = "task:get";
const DOWNLOAD: &str = "data:download";

/// Client for the asynchronous SaluteSpeech recognition API.
///
/// Cloning is cheap; clones share the HTTP connection pool and the token cache.
#[derive(Clone)]
pub struct SaluteSpeechClient {
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) tokens: Arc<TokenManager>,
    pub(crate) config: Arc<ClientConfig>,
}

#[derive(Deserialize)]
struct UploadResult {
    request_file_id: String,
}

impl SaluteSpeechClient {
    pub fn builder() -> SaluteSpeechClientBuilder {
        SaluteSpeechClientBuilder::new()
    }

    /// Default configuration with `SALUTE_SPEECH_*` overrides and credentials
    /// from the keyring or `SBER_SPEECH_API_KEY`.
    pub fn from_env() -> Result<Self> {
        SaluteSpeechClientBuilder::new().build()
    }

    /// High-level upload → recognize → poll → download flow.
    pub fn transcriptions(&self) -> Transcriptions<'_> {
        Transcriptions::new(self)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Send an authorized request. A 401 answer drops the token it was sent with.
    async fn send<F>(&self, build: F) -> Result<HttpResponse>
    where
        F: FnOnce(&reqwest::Client) -> RequestBuilder,
    {
        let credential = self.tokens.get_token().await?;
        let request = build(self.transport.client());
        let response = self.transport.execute(request, credential.token()).await?;
        if response.status == 401 {
            self.tokens.invalidate(&credential);
        }
        Ok(response)
    }

    /// Upload raw audio and return its `request_file_id`. Never retried.
    pub async fn upload_file(&self, audio: Bytes, descriptor: &AudioDescriptor) -> Result<String> {
        let url = self.transport.endpoint(UPLOAD);
        let content_type = descriptor.encoding.mime_type(descriptor.sample_rate);
        let size = audio.len();

        let response = self
            .send(|http| http.post(&url).header(CONTENT_TYPE, content_type).body(audio))
            .await
            .map_err(|e| match e {
                Error::Transport(t) => Error::file_upload(None, t.to_string()),
                other => other,
            })?;

        if !response.is_success() {
            return Err(Error::file_upload(Some(response.status), response.body));
        }
        let envelope = Envelope::parse(&response, UPLOAD)?;
        if let Some(status) = envelope.failure_status() {
            return Err(Error::file_upload(
                Some(status),
                format!("Upload rejected: {}", response.body),
            ));
        }
        let result: UploadResult = envelope.into_result(UPLOAD)?;
        info!(file_id = %result.request_file_id, bytes = size, "audio uploaded");
        Ok(result.request_file_id)
    }

    /// Create a recognition task for an uploaded file.
    pub async fn async_recognize(
        &self,
        request_file_id: &str,
        audio: &AudioDescriptor,
        language: &str,
        config: Option<&SpeechRecognitionConfig>,
    ) -> Result<RecognitionTask> {
        let url = self.transport.endpoint(RECOGNIZE);
        let body = recognize_body(request_file_id, audio, language, config)?;

        let response = self
            .send(|http| {
                http.post(&url)
                    .header(ACCEPT, "application/json")
                    .json(&body)
            })
            .await?;

        if !response.is_success() {
            return Err(Error::api(response.status, response.body));
        }
        let envelope = Envelope::parse(&response, RECOGNIZE)?;
        if let Some(status) = envelope.failure_status() {
            return Err(Error::api(status, response.body));
        }
        let task: RecognitionTask = envelope.into_result(RECOGNIZE)?;
        info!(task_id = %task.id, status = %task.status, file_id = %request_file_id, "recognition task created");
        Ok(task)
    }

    /// Fetch the current state of a task.
    ///
    /// Transient failures come back as `Api`/`Transport` errors so a poller can
    /// retry them; anything else is a `TaskStatusResponse` error.
    pub async fn get_task_status(&self, task_id: &str) -> Result<RecognitionTask> {
        let url = self.transport.endpoint(TASK_GET);
        let response = self
            .send(|http| {
                http.get(&url)
                    .query(&[("id", task_id)])
                    .header(ACCEPT, "application/json")
            })
            .await?;

        if !response.is_success() {
            return Err(status_failure(task_id, response.status, &response.body));
        }
        let envelope = Envelope::parse(&response, TASK_GET)?;
        if let Some(status) = envelope.failure_status() {
            return Err(status_failure(task_id, status, &response.body));
        }
        let task: RecognitionTask = envelope.into_result(TASK_GET)?;
        debug!(task_id = %task.id, status = %task.status, "task status");
        Ok(task)
    }

    /// Download the raw recognition payload of a finished task.
    pub async fn download_result(&self, response_file_id: &str) -> Result<String> {
        let url = self.transport.endpoint(DOWNLOAD);
        let response = self
            .send(|http| http.get(&url).query(&[("response_file_id", response_file_id)]))
            .await
            .map_err(|e| match e {
                Error::Transport(t) => Error::task_status(
                    None,
                    None,
                    format!("Failed to download result {}: {}", response_file_id, t),
                ),
                other => other,
            })?;

        if !response.is_success() {
            return Err(Error::task_status(
                None,
                None,
                format!(
                    "Failed to download result {} (HTTP {}): {}",
                    response_file_id, response.status, response.body
                ),
            ));
        }
        if response.body.trim().is_empty() {
            return Err(Error::task_status(
                None,
                None,
                format!("Result {} is empty", response_file_id),
            ));
        }
        debug!(file_id = %response_file_id, bytes = response.body.len(), "result downloaded");
        Ok(response.body)
    }
}

/// 401 and transient statuses stay retryable `Api` errors.
fn status_failure(task_id: &str, status: u16, body: &str) -> Error {
    let err = Error::api(status, body);
    if err.is_retryable() || status == 401 {
        err
    } else {
        Error::task_status(
            Some(task_id),
            None,
            format!("Status check failed (HTTP {}): {}", status, body),
        )
    }
}

fn recognize_body(
    request_file_id: &str,
    audio: &AudioDescriptor,
    language: &str,
    config: Option<&SpeechRecognitionConfig>,
) -> Result<Value> {
    let mut options = Map::new();
    options.insert("language".into(), json!(language));
    options.insert("audio_encoding".into(), json!(audio.encoding.as_str()));
    options.insert("sample_rate".into(), json!(audio.sample_rate));
    options.insert("channels_count".into(), json!(audio.channels));
    let extra = match config {
        Some(cfg) => cfg.to_options()?,
        None => SpeechRecognitionConfig::default().to_options()?,
    };
    options.extend(extra);
    Ok(json!({
        "options": options,
        "request_file_id": request_file_id,
    }))
}
