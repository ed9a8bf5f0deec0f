//! # salute-speech
//!
//! SaluteSpeech 异步语音识别 REST API 的 Rust 客户端。
//!
//! Client SDK for the SaluteSpeech asynchronous speech-to-text REST API.
//!
//! ## Overview
//!
//! A transcription is a short lifecycle against the remote service: the audio is
//! uploaded, a recognition task is created for it, the task is polled until it
//! finishes, and the per-channel result is downloaded and merged into one
//! ordered transcript. This crate runs that lifecycle behind a single call and
//! exposes each step for callers that need finer control.
//!
//! ## Key Features
//!
//! - **One-call transcription**: [`SaluteSpeechClient::transcriptions`] → `create()`
//! - **Local validation**: audio parameters and recognition options are checked before any upload
//! - **Token cache**: OAuth tokens are reused until close to expiry, with single-flight refresh
//! - **Cancellable polling**: fixed cadence, transient failures retried, optional deadline
//! - **Output formats**: txt, vtt, srt, tsv and json via [`render`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use salute_speech::{SaluteSpeechClient, TranscriptionOptions};
//!
//! #[tokio::main]
//! async fn main() -> salute_speech::Result<()> {
//!     // Credentials come from the OS keyring or SBER_SPEECH_API_KEY.
//!     let client = SaluteSpeechClient::from_env()?;
//!
//!     let audio = tokio::fs::File::open("meeting.wav").await?;
//!     let transcript = client
//!         .transcriptions()
//!         .create(audio, &TranscriptionOptions::new().language("ru-RU"))
//!         .await?;
//!
//!     println!("{}", transcript.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`audio`] | Audio descriptors, container probing and validation |
//! | [`auth`] | Client credentials and the bearer token cache |
//! | [`client`] | Service calls and the transcription flow |
//! | [`recognition`] | Recognition options and task state |
//! | [`transcript`] | Transcript types and result normalization |
//! | [`render`] | txt / vtt / srt / tsv / json output |
//! | [`config`] | Client configuration |

pub mod audio;
pub mod auth;
pub mod client;
pub mod config;
pub mod error_code;
pub mod recognition;
pub mod render;
pub mod transcript;
pub mod transport;

// Re-export main types for convenience
pub use audio::{AudioDescriptor, AudioEncoding, AudioValidator};
pub use auth::{ClientCredentials, Credential, TokenManager};
pub use client::{
    SaluteSpeechClient, SaluteSpeechClientBuilder, TranscriptionOptions, TranscriptionOutput,
    Transcriptions,
};
pub use config::ClientConfig;
pub use error_code::StandardErrorCode;
pub use recognition::{RecognitionTask, SpeechRecognitionConfig, TaskStatus};
pub use render::{parse_json, render, OutputFormat};
pub use transcript::{
    ResultNormalizer, TieBreak, TranscriptionResponse, TranscriptionSegment,
};
pub use tokio_util::sync::CancellationToken;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
