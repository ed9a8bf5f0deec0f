use crate::transcript::{TranscriptionResponse, TranscriptionSegment};
use crate::{Error, ErrorContext, Result};
use serde::Serialize;

#[derive(Serialize)]
struct JsonTranscript<'a> {
    text: &'a str,
    duration: f64,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    segments: Option<&'a [TranscriptionSegment]>,
}

pub(super) fn json(response: &TranscriptionResponse) -> Result<String> {
    let doc = JsonTranscript {
        text: &response.text,
        duration: response.duration,
        language: &response.language,
        segments: response.segments.as_deref(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Read back a document produced by the `json` format.
pub fn parse_json(input: &str) -> Result<TranscriptionResponse> {
    serde_json::from_str(input).map_err(|e| {
        Error::invalid_response_with_context(
            format!("Failed to parse transcript JSON: {}", e),
            ErrorContext::new().with_source("render"),
        )
    })
}

pub(super) fn tsv(segments: &[TranscriptionSegment]) -> String {
    let mut out = String::from("start\tend\ttext\n");
    for seg in segments {
        let text = seg.text.trim().replace(['\t', '\n', '\r'], " ");
        out.push_str(&format!(
            "{:.3}\t{:.3}\t{}\n",
            super::to_millis(seg.start) as f64 / 1000.0,
            super::to_millis(seg.end) as f64 / 1000.0,
            text
        ));
    }
    out
}
