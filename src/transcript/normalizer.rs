//! Raw recognition payload → ordered transcript.
//!
//! The downloaded payload is a JSON array of utterances. Every utterance carries
//! a hypothesis list (best first) and the channel it was heard on; utterances of
//! different channels interleave in time and are merged here.

use super::types::{TranscriptionResponse, TranscriptionSegment};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use std::cmp::Ordering;

const DEFAULT_LANGUAGE: &str = "ru";

/// Ordering of segments that start at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Lower channel first, then payload position.
    #[default]
    ChannelThenIndex,
    /// Payload position only.
    PayloadOrder,
}

struct Utterance {
    index: usize,
    channel: u64,
    start: f64,
    end: f64,
    text: String,
}

/// Pure and deterministic; the same payload always yields the same transcript.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultNormalizer {
    tie_break: TieBreak,
}

impl ResultNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Parse and normalize a downloaded payload.
    pub fn normalize(&self, payload: &str, language: &str) -> Result<TranscriptionResponse> {
        let value: Value = serde_json::from_str(payload).map_err(|e| {
            Error::invalid_response_with_context(
                format!("Failed to parse recognition result: {}", e),
                ErrorContext::new().with_source("result_normalizer"),
            )
        })?;
        self.normalize_value(&value, language)
    }

    pub fn normalize_value(&self, payload: &Value, language: &str) -> Result<TranscriptionResponse> {
        let entries = payload.as_array().ok_or_else(|| {
            malformed("result", "Unexpected recognition result format: expected a JSON array")
        })?;

        let mut utterances = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if let Some(u) = parse_entry(index, entry)? {
                utterances.push(u);
            }
        }

        utterances.sort_by(|a, b| self.compare(a, b));

        let duration = utterances.iter().map(|u| u.end).fold(0.0_f64, f64::max);
        let text = utterances
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let segments = utterances
            .into_iter()
            .enumerate()
            .map(|(id, u)| TranscriptionSegment {
                id,
                start: u.start,
                end: u.end,
                text: u.text,
            })
            .collect();

        Ok(TranscriptionResponse {
            duration,
            language: primary_language(language),
            text,
            segments: Some(segments),
            status: String::new(),
            task_id: String::new(),
        })
    }

    fn compare(&self, a: &Utterance, b: &Utterance) -> Ordering {
        let by_start = a.start.total_cmp(&b.start);
        match self.tie_break {
            TieBreak::ChannelThenIndex => by_start
                .then(a.channel.cmp(&b.channel))
                .then(a.index.cmp(&b.index)),
            TieBreak::PayloadOrder => by_start.then(a.index.cmp(&b.index)),
        }
    }
}

/// Bare lower-case primary subtag: `ru-RU` → `ru`, empty → `ru`.
pub fn primary_language(language: &str) -> String {
    language
        .split(|c| c == '-' || c == '_')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_lowercase()
}

fn malformed(field: impl Into<String>, message: impl Into<String>) -> Error {
    Error::invalid_response_with_context(
        message,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("result_normalizer"),
    )
}

fn parse_entry(index: usize, entry: &Value) -> Result<Option<Utterance>> {
    let path = format!("result[{}]", index);
    let obj = entry
        .as_object()
        .ok_or_else(|| malformed(&path, "Result entry is not an object"))?;

    let results = obj
        .get("results")
        .ok_or_else(|| malformed(format!("{}.results", path), "Result entry has no 'results'"))?
        .as_array()
        .ok_or_else(|| malformed(format!("{}.results", path), "'results' is not an array"))?;

    let channel = match obj.get("channel") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .ok_or_else(|| malformed(format!("{}.channel", path), "'channel' is not a channel number"))?,
    };

    let best = match results.first() {
        Some(best) => best,
        None => return Ok(None),
    };
    let best_path = format!("{}.results[0]", path);

    let text = best
        .get("normalized_text")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| best.get("text").and_then(Value::as_str))
        .unwrap_or("")
        .trim();
    if text.is_empty() {
        return Ok(None);
    }

    let start = match best.get("start") {
        None | Some(Value::Null) => 0.0,
        Some(v) => parse_seconds(v, &format!("{}.start", best_path))?,
    };
    let end = match best.get("end") {
        None | Some(Value::Null) => start,
        Some(v) => parse_seconds(v, &format!("{}.end", best_path))?,
    };
    if end < start {
        return Err(malformed(
            format!("{}.end", best_path),
            format!("Segment ends before it starts ({} < {})", end, start),
        ));
    }

    Ok(Some(Utterance {
        index,
        channel,
        start,
        end,
        text: text.to_string(),
    }))
}

/// Accepts `1.5`, `"1.5"` and `"1.5s"`.
fn parse_seconds(value: &Value, field: &str) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            s.strip_suffix('s').unwrap_or(s).trim().parse::<f64>().ok()
        }
        _ => None,
    };
    match parsed {
        Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        Some(secs) => Err(malformed(field, format!("Negative or non-finite timestamp: {}", secs))),
        None => Err(malformed(field, format!("Non-numeric timestamp: {}", value))),
    }
}
