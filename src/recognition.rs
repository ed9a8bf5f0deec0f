//! 识别任务：请求参数与任务状态。
//!
//! Recognition task options and the server-side task model.

pub mod config;
pub mod task;

pub use config::SpeechRecognitionConfig;
pub use task::{RecognitionTask, TaskStatus};
