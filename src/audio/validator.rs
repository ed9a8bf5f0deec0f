//! Pre-flight validation of audio parameters against the service capability table.

use super::descriptor::{AudioDescriptor, AudioEncoding};
use crate::{Error, ErrorContext, Result};
use std::ops::RangeInclusive;
use tracing::debug;

/// Limits the service enforces for one encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingRule {
    pub max_channels: u16,
    /// `None` means any positive sample rate is accepted.
    pub sample_rate_range: Option<RangeInclusive<u32>>,
}

/// Stateless validator; every method is a pure function of its input.
pub struct AudioValidator;

impl AudioValidator {
    /// Capability row for `encoding`.
    pub fn rule(encoding: AudioEncoding) -> EncodingRule {
        match encoding {
            AudioEncoding::PcmS16le | AudioEncoding::Alaw | AudioEncoding::Mulaw => EncodingRule {
                max_channels: 8,
                sample_rate_range: Some(8_000..=96_000),
            },
            AudioEncoding::Opus => EncodingRule {
                max_channels: 1,
                sample_rate_range: None,
            },
            AudioEncoding::Mp3 => EncodingRule {
                max_channels: 2,
                sample_rate_range: None,
            },
            AudioEncoding::Flac => EncodingRule {
                max_channels: 8,
                sample_rate_range: None,
            },
        }
    }

    /// Reject descriptors the service would refuse.
    pub fn validate(descriptor: &AudioDescriptor) -> Result<()> {
        let rule = Self::rule(descriptor.encoding);
        let encoding = descriptor.encoding;

        if descriptor.channels == 0 {
            return Err(Error::validation_with_context(
                format!("Channel count must be positive for {}", encoding),
                ErrorContext::new()
                    .with_field_path("audio.channels")
                    .with_source("audio_validator"),
            ));
        }
        if descriptor.channels > rule.max_channels {
            return Err(Error::validation_with_context(
                format!(
                    "Too many channels ({}) for {}. Maximum allowed channels is {}",
                    descriptor.channels, encoding, rule.max_channels
                ),
                ErrorContext::new()
                    .with_field_path("audio.channels")
                    .with_details("convert the audio to fewer channels before uploading")
                    .with_source("audio_validator"),
            ));
        }

        if descriptor.sample_rate == 0 {
            return Err(Error::validation_with_context(
                format!("Sample rate must be positive for {}", encoding),
                ErrorContext::new()
                    .with_field_path("audio.sample_rate")
                    .with_source("audio_validator"),
            ));
        }
        if let Some(range) = &rule.sample_rate_range {
            if !range.contains(&descriptor.sample_rate) {
                return Err(Error::validation_with_context(
                    format!(
                        "Sample rate {}Hz is out of valid range [{}-{}]Hz for {}",
                        descriptor.sample_rate,
                        range.start(),
                        range.end(),
                        encoding
                    ),
                    ErrorContext::new()
                        .with_field_path("audio.sample_rate")
                        .with_details("resample the audio before uploading")
                        .with_source("audio_validator"),
                ));
            }
        }

        debug!(
            encoding = %encoding,
            sample_rate = descriptor.sample_rate,
            channels = descriptor.channels,
            "audio parameters validated"
        );
        Ok(())
    }

    /// Parse an encoding name and validate the resulting descriptor.
    pub fn validate_params(encoding: &str, sample_rate: u32, channels: u16) -> Result<AudioDescriptor> {
        let descriptor = AudioDescriptor::new(encoding.parse()?, sample_rate, channels);
        Self::validate(&descriptor)?;
        Ok(descriptor)
    }
}
