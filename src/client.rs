//! SaluteSpeech 客户端：上传、创建任务、轮询与下载结果。
//!
//! Client for the asynchronous recognition API.
//!
//! [`SaluteSpeechClient`] exposes the four service calls directly; the
//! [`Transcriptions`] surface chains them into one `create()` call.

pub mod builder;
pub mod core;
mod poller;
mod response;
pub mod transcriptions;

pub use builder::SaluteSpeechClientBuilder;
pub use core::SaluteSpeechClient;
pub use transcriptions::{TranscriptionOptions, TranscriptionOutput, Transcriptions};
