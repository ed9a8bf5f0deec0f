//! 输出格式：txt / vtt / srt / tsv / json。
//!
//! Rendering of a [`TranscriptionResponse`] into the supported output formats.
//! Rendering is pure; writing files is the caller's business.

mod subtitles;
mod text;

use crate::transcript::TranscriptionResponse;
use crate::{Error, ErrorContext, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use text::parse_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Txt,
    Vtt,
    Srt,
    Tsv,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Txt,
        OutputFormat::Vtt,
        OutputFormat::Srt,
        OutputFormat::Tsv,
        OutputFormat::Json,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Vtt => "vtt",
            OutputFormat::Srt => "srt",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }

    /// Format implied by the file extension, `txt` when unknown or absent.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == wanted)
            .ok_or_else(|| {
                Error::validation_with_context(
                    format!("Unsupported output format: {}", s),
                    ErrorContext::new()
                        .with_field_path("output_format")
                        .with_details("expected one of txt, vtt, srt, tsv, json"),
                )
            })
    }
}

/// Render `response` as `format`.
pub fn render(response: &TranscriptionResponse, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Txt => Ok(response.text.clone()),
        OutputFormat::Vtt => Ok(subtitles::vtt(response.segments())),
        OutputFormat::Srt => Ok(subtitles::srt(response.segments())),
        OutputFormat::Tsv => Ok(text::tsv(response.segments())),
        OutputFormat::Json => text::json(response),
    }
}

/// Whole milliseconds, rounded to nearest.
pub(crate) fn to_millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}
