use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static TIMEOUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)s$").expect("timeout pattern is a valid regex"));

pub const MAX_HYPOTHESES: u32 = 10;

/// Recognition tuning sent inside the task `options` object.
///
/// Serialized fields are merged verbatim next to the audio parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechRecognitionConfig {
    pub hypotheses_count: u32,
    pub enable_profanity_filter: bool,
    /// Longest utterance before a forced cut, e.g. `"20s"`.
    pub max_speech_timeout: String,
    /// Silence allowed before the first word, e.g. `"7s"`.
    pub no_speech_timeout: String,
    pub hints: Map<String, Value>,
    pub insight_models: Vec<String>,
    pub speaker_separation_options: Map<String, Value>,
}

impl Default for SpeechRecognitionConfig {
    fn default() -> Self {
        Self {
            hypotheses_count: 1,
            enable_profanity_filter: false,
            max_speech_timeout: "20s".to_string(),
            no_speech_timeout: "7s".to_string(),
            hints: Map::new(),
            insight_models: Vec::new(),
            speaker_separation_options: Map::new(),
        }
    }
}

impl SpeechRecognitionConfig {
    pub fn with_hypotheses_count(mut self, n: u32) -> Self {
        self.hypotheses_count = n;
        self
    }

    pub fn with_profanity_filter(mut self, enable: bool) -> Self {
        self.enable_profanity_filter = enable;
        self
    }

    pub fn with_max_speech_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.max_speech_timeout = timeout.into();
        self
    }

    pub fn with_no_speech_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.no_speech_timeout = timeout.into();
        self
    }

    /// Add a recognition hint such as `words` or `enable_letters`.
    pub fn with_hint(mut self, key: impl Into<String>, value: Value) -> Self {
        self.hints.insert(key.into(), value);
        self
    }

    pub fn with_insight_model(mut self, model: impl Into<String>) -> Self {
        self.insight_models.push(model.into());
        self
    }

    pub fn with_speaker_separation(mut self, key: impl Into<String>, value: Value) -> Self {
        self.speaker_separation_options.insert(key.into(), value);
        self
    }

    /// Reject values the service would refuse, before anything is uploaded.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_HYPOTHESES).contains(&self.hypotheses_count) {
            return Err(invalid(
                "config.hypotheses_count",
                format!(
                    "hypotheses_count must be between 1 and {}, got {}",
                    MAX_HYPOTHESES, self.hypotheses_count
                ),
            ));
        }
        check_timeout("config.max_speech_timeout", &self.max_speech_timeout)?;
        check_timeout("config.no_speech_timeout", &self.no_speech_timeout)?;
        Ok(())
    }

    /// Flattened JSON fields, ready to merge into the task options.
    pub fn to_options(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::invalid_response(format!(
                "recognition config serialized to a non-object: {}",
                other
            ))),
        }
    }
}

fn check_timeout(field: &str, value: &str) -> Result<()> {
    let positive = TIMEOUT_RE
        .captures(value)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map_or(false, |secs| secs > 0);
    if positive {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("'{}' is not a positive duration like \"20s\"", value),
        ))
    }
}

fn invalid(field: &str, message: String) -> Error {
    Error::validation_with_context(
        message,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("recognition_config"),
    )
}
