//! Fixed-cadence polling of a recognition task until it reaches a terminal state.

use super::core::SaluteSpeechClient;
use crate::recognition::RecognitionTask;
use crate::{Error, Result};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub(crate) struct TaskPoller<'a> {
    client: &'a SaluteSpeechClient,
    interval: Duration,
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl<'a> TaskPoller<'a> {
    pub fn new(client: &'a SaluteSpeechClient, interval: Duration) -> Self {
        Self {
            client,
            interval: interval.max(MIN_INTERVAL),
            deadline: None,
            cancel: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.deadline = timeout.map(|t| Instant::now() + t);
        self
    }

    pub fn with_cancel(mut self, cancel: Option<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Check immediately, then once per interval, until DONE, ERROR or CANCELLED.
    ///
    /// Transport failures, 401, transient statuses and transient token refresh
    /// failures are retried at the next tick; any other failure ends the loop.
    pub async fn wait(&self, task_id: &str) -> Result<RecognitionTask> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempt: u32 = 0;

        loop {
            let check = async {
                ticker.tick().await;
                self.client.get_task_status(task_id).await
            };

            let outcome = tokio::select! {
                biased;
                _ = cancelled(self.cancel.as_ref()) => {
                    return Err(Error::cancelled(format!("Polling of task {} was cancelled", task_id)));
                }
                _ = deadline(self.deadline) => {
                    return Err(Error::cancelled(format!("Timed out waiting for task {}", task_id)));
                }
                outcome = check => outcome,
            };
            attempt += 1;

            match outcome {
                Ok(task) if task.is_terminal() => {
                    debug!(task_id, attempt, status = %task.status, "task finished");
                    return Ok(task);
                }
                Ok(task) => {
                    debug!(task_id, attempt, status = %task.status, "task pending");
                }
                Err(e) if retry_status_check(&e) => {
                    warn!(task_id, attempt, error = %e, "status check failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// A rejected token is refreshed on the next tick; rejected credentials are final.
fn retry_status_check(err: &Error) -> bool {
    match err {
        Error::TokenRequest { status: None, .. } => true,
        Error::TokenRequest {
            status: Some(status),
            ..
        } => *status == 429 || (500..600).contains(status),
        Error::Api { status: 401, .. } => true,
        other => other.is_retryable(),
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
