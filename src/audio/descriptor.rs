use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Audio encodings understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    #[serde(rename = "PCM_S16LE")]
    PcmS16le,
    Opus,
    Mp3,
    Flac,
    Alaw,
    Mulaw,
}

impl AudioEncoding {
    pub const ALL: [AudioEncoding; 6] = [
        AudioEncoding::PcmS16le,
        AudioEncoding::Opus,
        AudioEncoding::Mp3,
        AudioEncoding::Flac,
        AudioEncoding::Alaw,
        AudioEncoding::Mulaw,
    ];

    /// Wire name used in the task options (`audio_encoding`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PcmS16le => "PCM_S16LE",
            Self::Opus => "OPUS",
            Self::Mp3 => "MP3",
            Self::Flac => "FLAC",
            Self::Alaw => "ALAW",
            Self::Mulaw => "MULAW",
        }
    }

    /// `Content-Type` of an upload in this encoding.
    pub fn mime_type(&self, sample_rate: u32) -> String {
        match self {
            Self::PcmS16le => format!("audio/x-pcm;bit=16;rate={}", sample_rate),
            Self::Opus => "audio/ogg;codecs=opus".to_string(),
            Self::Mp3 => "audio/mpeg".to_string(),
            Self::Flac => "audio/flac".to_string(),
            Self::Alaw => format!("audio/pcma;rate={}", sample_rate),
            Self::Mulaw => format!("audio/pcmu;rate={}", sample_rate),
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PCM_S16LE" | "PCM" | "WAV" => Ok(Self::PcmS16le),
            "OPUS" => Ok(Self::Opus),
            "MP3" => Ok(Self::Mp3),
            "FLAC" => Ok(Self::Flac),
            "ALAW" | "PCM_ALAW" => Ok(Self::Alaw),
            "MULAW" | "PCM_MULAW" => Ok(Self::Mulaw),
            other => Err(Error::validation_with_context(
                format!("Unsupported audio encoding: {}", other),
                ErrorContext::new()
                    .with_field_path("audio.encoding")
                    .with_details("expected one of PCM_S16LE, OPUS, MP3, FLAC, ALAW, MULAW")
                    .with_source("audio_validator"),
            )),
        }
    }
}

/// Encoding, sample rate and channel count of one audio payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDescriptor {
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioDescriptor {
    pub fn new(encoding: AudioEncoding, sample_rate: u32, channels: u16) -> Self {
        Self {
            encoding,
            sample_rate,
            channels,
        }
    }
}

impl fmt::Display for AudioDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} Hz, {} channel(s)",
            self.encoding, self.sample_rate, self.channels
        )
    }
}
