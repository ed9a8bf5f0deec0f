use serde::{Deserialize, Serialize};

/// A time-bounded piece of the merged transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    /// Position in the final ordering, starting at 0.
    pub id: usize,
    /// Seconds from the start of the audio.
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Verbose transcription result: merged text plus ordered segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    /// Latest segment end, in seconds.
    pub duration: f64,
    /// Primary language subtag, e.g. `ru`.
    pub language: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<TranscriptionSegment>>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub task_id: String,
}

impl TranscriptionResponse {
    pub fn segments(&self) -> &[TranscriptionSegment] {
        self.segments.as_deref().unwrap_or(&[])
    }

    /// Attach the task the transcript came from.
    pub fn with_task(mut self, task_id: impl Into<String>, status: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self.status = status.into();
        self
    }
}
