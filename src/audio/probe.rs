//! Container sniffing: derive an [`AudioDescriptor`] from raw bytes without decoding.

use super::descriptor::{AudioDescriptor, AudioEncoding};
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use std::io::Cursor;
use symphonia::core::codecs::{
    CodecType, CODEC_TYPE_FLAC, CODEC_TYPE_MP3, CODEC_TYPE_OPUS, CODEC_TYPE_PCM_ALAW,
    CODEC_TYPE_PCM_MULAW, CODEC_TYPE_PCM_S16LE,
};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

fn encoding_for(codec: CodecType) -> Option<AudioEncoding> {
    match codec {
        CODEC_TYPE_PCM_S16LE => Some(AudioEncoding::PcmS16le),
        CODEC_TYPE_PCM_ALAW => Some(AudioEncoding::Alaw),
        CODEC_TYPE_PCM_MULAW => Some(AudioEncoding::Mulaw),
        CODEC_TYPE_FLAC => Some(AudioEncoding::Flac),
        CODEC_TYPE_MP3 => Some(AudioEncoding::Mp3),
        CODEC_TYPE_OPUS => Some(AudioEncoding::Opus),
        _ => None,
    }
}

fn undetectable(details: impl Into<String>) -> Error {
    Error::validation_with_context(
        "Unable to detect audio parameters. The file may be empty or invalid",
        ErrorContext::new()
            .with_details(details)
            .with_source("audio_probe"),
    )
}

/// Probe the container of `bytes` and describe its default track.
///
/// The result is not validated; pass it to [`super::AudioValidator::validate`].
pub fn probe(bytes: &Bytes) -> Result<AudioDescriptor> {
    if bytes.is_empty() {
        return Err(undetectable("empty input"));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.clone())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| undetectable(format!("probe: {}", e)))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| undetectable("no audio track found"))?;
    let params = &track.codec_params;

    let encoding = encoding_for(params.codec).ok_or_else(|| {
        let name = symphonia::default::get_codecs()
            .get_codec(params.codec)
            .map(|d| d.short_name.to_string())
            .unwrap_or_else(|| params.codec.to_string());
        Error::validation_with_context(
            format!("Unsupported audio encoding: {}", name),
            ErrorContext::new()
                .with_field_path("audio.encoding")
                .with_details("expected PCM_S16LE, OPUS, MP3, FLAC, ALAW or MULAW")
                .with_source("audio_probe"),
        )
    })?;

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| undetectable("unknown sample rate"))?;
    let channels = params
        .channels
        .map(|c| c.count())
        .or_else(|| params.channel_layout.map(|l| l.into_channels().count()))
        .ok_or_else(|| undetectable("unknown channel count"))?;

    Ok(AudioDescriptor::new(
        encoding,
        sample_rate,
        u16::try_from(channels).unwrap_or(u16::MAX),
    ))
}
