//! SubRip and WebVTT cue writers.

use super::to_millis;
use crate::transcript::TranscriptionSegment;

fn timestamp(seconds: f64, decimal_marker: char) -> String {
    let ms = to_millis(seconds);
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, mins, secs, decimal_marker, millis
    )
}

/// `-->` would end the timing line early in players.
fn cue_text(text: &str) -> String {
    text.trim().replace("-->", "->")
}

pub(super) fn srt(segments: &[TranscriptionSegment]) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                timestamp(seg.start, ','),
                timestamp(seg.end, ','),
                cue_text(&seg.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn vtt(segments: &[TranscriptionSegment]) -> String {
    let cues = segments
        .iter()
        .map(|seg| {
            format!(
                "{} --> {}\n{}\n",
                timestamp(seg.start, '.'),
                timestamp(seg.end, '.'),
                cue_text(&seg.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("WEBVTT\n\n{}", cues)
}
