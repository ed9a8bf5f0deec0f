//! 识别结果：统一的转写结构与归一化。
//!
//! Transcript model and the normalizer that turns the raw per-channel
//! recognition payload into it.

pub mod normalizer;
pub mod types;

pub use normalizer::{primary_language, ResultNormalizer, TieBreak};
pub use types::{TranscriptionResponse, TranscriptionSegment};
