use super::core::SaluteSpeechClient;
use super::poller::TaskPoller;
use crate::audio::{self, AudioDescriptor, AudioValidator};
use crate::recognition::{RecognitionTask, SpeechRecognitionConfig, TaskStatus};
use crate::transcript::{ResultNormalizer, TieBreak, TranscriptionResponse};
use crate::{Error, Result};
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Parameters of one transcription.
#[derive(Debug, Clone)]
pub struct TranscriptionOptions {
    /// Recognition language such as `ru-RU`, `en-US` or `kk-KZ`.
    pub language: String,
    pub config: Option<SpeechRecognitionConfig>,
    pub poll_interval: Duration,
    /// Accepted for API compatibility; the service has no equivalent.
    pub prompt: Option<String>,
    /// Accepted for API compatibility; use [`crate::render`] to pick an output format.
    pub response_format: Option<String>,
    /// Skip probing and use this descriptor.
    pub audio: Option<AudioDescriptor>,
    /// Upper bound on the time spent polling.
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
    pub tie_break: TieBreak,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            language: "ru-RU".to_string(),
            config: None,
            poll_interval: Duration::from_secs(1),
            prompt: None,
            response_format: None,
            audio: None,
            timeout: None,
            cancel: None,
            tie_break: TieBreak::default(),
        }
    }
}

impl TranscriptionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn config(mut self, config: SpeechRecognitionConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = Some(format.into());
        self
    }

    pub fn audio(mut self, descriptor: AudioDescriptor) -> Self {
        self.audio = Some(descriptor);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }
}

/// Transcript together with the payload and task it was built from.
#[derive(Debug, Clone)]
pub struct TranscriptionOutput {
    pub response: TranscriptionResponse,
    /// Downloaded payload, unmodified.
    pub raw: String,
    pub task: RecognitionTask,
}

/// Entry point of the high-level flow, see [`SaluteSpeechClient::transcriptions`].
pub struct Transcriptions<'a> {
    client: &'a SaluteSpeechClient,
}

impl<'a> Transcriptions<'a> {
    pub(crate) fn new(client: &'a SaluteSpeechClient) -> Self {
        Self { client }
    }

    /// Transcribe everything readable from `source`.
    pub async fn create<R>(&self, source: R, options: &TranscriptionOptions) -> Result<TranscriptionResponse>
    where
        R: AsyncRead + Unpin + Send,
    {
        Ok(self.create_with_raw(source, options).await?.response)
    }

    /// Like [`Self::create`], also returning the raw payload.
    pub async fn create_with_raw<R>(&self, source: R, options: &TranscriptionOptions) -> Result<TranscriptionOutput>
    where
        R: AsyncRead + Unpin + Send,
    {
        if options.prompt.is_some() || options.response_format.is_some() {
            debug!("prompt and response_format are not supported by the service, ignoring");
        }

        let bytes = audio::read_source(source).await?;
        let descriptor = match options.audio {
            Some(descriptor) => descriptor,
            None => audio::probe(&bytes)?,
        };
        AudioValidator::validate(&descriptor)?;
        if let Some(config) = &options.config {
            config.validate()?;
        }
        debug!(audio = %descriptor, bytes = bytes.len(), language = %options.language, "starting transcription");

        let file_id = self.client.upload_file(bytes, &descriptor).await?;
        let task = self
            .client
            .async_recognize(&file_id, &descriptor, &options.language, options.config.as_ref())
            .await?;

        let finished = TaskPoller::new(self.client, options.poll_interval)
            .with_timeout(options.timeout)
            .with_cancel(options.cancel.clone())
            .wait(&task.id)
            .await?;

        let raw = self.fetch_result(&finished).await?;
        let response = ResultNormalizer::new()
            .with_tie_break(options.tie_break)
            .normalize(&raw, &options.language)?
            .with_task(finished.id.clone(), finished.status.as_str());

        info!(
            task_id = %finished.id,
            segments = response.segments().len(),
            duration = response.duration,
            "transcription complete"
        );
        Ok(TranscriptionOutput {
            response,
            raw,
            task: finished,
        })
    }

    async fn fetch_result(&self, task: &RecognitionTask) -> Result<String> {
        match task.status {
            TaskStatus::Done => {
                let file_id = task.response_file_id.as_deref().ok_or_else(|| {
                    Error::task_status(
                        Some(&task.id),
                        Some(task.status.as_str()),
                        "Task is DONE but has no response_file_id",
                    )
                })?;
                self.client.download_result(file_id).await.map_err(|e| match e {
                    Error::TaskStatusResponse { message, .. } => Error::task_status(
                        Some(&task.id),
                        Some(task.status.as_str()),
                        message,
                    ),
                    other => other,
                })
            }
            _ => Err(Error::task_status(
                Some(&task.id),
                Some(task.status.as_str()),
                task.failure_message(),
            )),
        }
    }
}
