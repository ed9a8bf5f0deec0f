use crate::error_code::StandardErrorCode;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.hypotheses_count", "result[2].results")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "audio_validator", "result_normalizer")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the SaluteSpeech client.
///
/// Each failure kind of the recognition lifecycle is its own variant so callers
/// can match on exactly the step that failed.
#[derive(Debug, Error)]
pub enum Error {
    /// Audio descriptor or recognition config rejected before any network call.
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// The OAuth endpoint failed or returned an unusable credential.
    #[error("Token request failed{}: {message}", format_status(.status))]
    TokenRequest { status: Option<u16>, message: String },

    /// The audio upload failed. Uploads are never retried.
    #[error("File upload failed{}: {message}", format_status(.status))]
    FileUpload { status: Option<u16>, message: String },

    /// The task ended in ERROR/CANCELLED, or a status check / result fetch failed for good.
    #[error("Task status error{}: {message}", format_task(.task_id, .status))]
    TaskStatusResponse {
        task_id: Option<String>,
        status: Option<String>,
        message: String,
    },

    /// A service payload was malformed or lacked required fields.
    #[error("Invalid response: {message}{}", format_context(.context))]
    InvalidResponse {
        message: String,
        context: ErrorContext,
    },

    /// Otherwise unclassified non-success answer from the service.
    #[error("API error: HTTP {status} ({}): {message}", code_name(.code))]
    Api {
        status: u16,
        code: StandardErrorCode,
        message: String,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// Polling was aborted by the caller's cancellation token or deadline.
    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

fn code_name(code: &StandardErrorCode) -> &'static str {
    code.name()
}

fn format_task(task_id: &Option<String>, status: &Option<String>) -> String {
    match (task_id, status) {
        (Some(id), Some(st)) => format!(" (task {}, status {})", id, st),
        (Some(id), None) => format!(" (task {})", id),
        (None, Some(st)) => format!(" (status {})", st),
        (None, None) => String::new(),
    }
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::validation_with_context(msg, ErrorContext::new())
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::invalid_response_with_context(msg, ErrorContext::new())
    }

    /// Create a new invalid-response error with structured context
    pub fn invalid_response_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidResponse {
            message: msg.into(),
            context,
        }
    }

    pub fn token_request(status: Option<u16>, msg: impl Into<String>) -> Self {
        Error::TokenRequest {
            status,
            message: msg.into(),
        }
    }

    pub fn file_upload(status: Option<u16>, msg: impl Into<String>) -> Self {
        Error::FileUpload {
            status,
            message: msg.into(),
        }
    }

    pub fn task_status(
        task_id: Option<&str>,
        status: Option<&str>,
        msg: impl Into<String>,
    ) -> Self {
        Error::TaskStatusResponse {
            task_id: task_id.map(String::from),
            status: status.map(String::from),
            message: msg.into(),
        }
    }

    /// Create a catch-all API error, classifying the status code.
    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Error::Api {
            status,
            code: StandardErrorCode::from_http_status(status),
            message: msg.into(),
        }
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Error::Cancelled {
            message: msg.into(),
        }
    }

    /// Name of the error kind, as surfaced by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "ValidationError",
            Error::TokenRequest { .. } => "TokenRequestError",
            Error::FileUpload { .. } => "FileUploadError",
            Error::TaskStatusResponse { .. } => "TaskStatusResponseError",
            Error::InvalidResponse { .. } => "InvalidResponseError",
            Error::Api { .. } => "ApiError",
            Error::Configuration { .. } => "ConfigurationError",
            Error::Cancelled { .. } => "CancelledError",
            Error::Transport(_) => "TransportError",
            Error::Io(_) => "IoError",
            Error::Serialization(_) => "SerializationError",
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::TokenRequest { status, .. } | Error::FileUpload { status, .. } => *status,
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failed call may be repeated without side effects.
    ///
    /// Transport failures and transient service statuses qualify; everything
    /// else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Api { code, .. } => code.retryable(),
            _ => false,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. }
            | Error::InvalidResponse { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}
