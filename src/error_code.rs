//! HTTP 状态分类：决定轮询中的失败是可重试的瞬时错误还是致命错误。
//!
//! Classification of service failures.
//!
//! The SaluteSpeech REST API reports failures twice: as the HTTP status and as
//! the `status` field of the JSON envelope. Both are mapped onto the same small
//! set of codes so the client can decide whether a failed status check is worth
//! another poll tick.
//!
//! | Prefix | Category    | Description                    |
//! |--------|-------------|--------------------------------|
//! | E1xxx  | client      | Request-side errors            |
//! | E2xxx  | rate        | Rate limit errors              |
//! | E3xxx  | server      | Service-side errors            |
//! | E4xxx  | operational | Lifecycle and state conflicts  |
//! | E9xxx  | unknown     | Catch-all / unclassified       |
//!
//! ## Example
//!
//! ```rust
//! use salute_speech::error_code::StandardErrorCode;
//!
//! let code = StandardErrorCode::from_http_status(503);
//! assert_eq!(code.code(), "E3002");
//! assert!(code.retryable());
//! assert_eq!(code.category(), "server");
//! ```

use std::fmt;

/// Canonical error code for a failed service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardErrorCode {
    /// E1001: Malformed request, invalid parameters, or missing required fields
    InvalidRequest,
    /// E1002: Invalid, expired, or missing bearer token
    Authentication,
    /// E1003: Valid credentials but insufficient permissions for the scope
    PermissionDenied,
    /// E1004: Unknown task, file or endpoint
    NotFound,
    /// E1005: Audio payload exceeds the upload limit
    RequestTooLarge,
    /// E2001: Request rate limit exceeded
    RateLimited,
    /// E3001: Internal server error on the service side
    ServerError,
    /// E3002: Service temporarily overloaded or unavailable
    Overloaded,
    /// E3003: Request timed out before a response was produced
    Timeout,
    /// E4001: State conflict
    Conflict,
    /// E9999: Error could not be classified
    Unknown,
}

impl StandardErrorCode {
    /// Returns the canonical code string (e.g., `"E1001"`).
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "E1001",
            Self::Authentication => "E1002",
            Self::PermissionDenied => "E1003",
            Self::NotFound => "E1004",
            Self::RequestTooLarge => "E1005",
            Self::RateLimited => "E2001",
            Self::ServerError => "E3001",
            Self::Overloaded => "E3002",
            Self::Timeout => "E3003",
            Self::Conflict => "E4001",
            Self::Unknown => "E9999",
        }
    }

    /// Returns the standard name (e.g., `"invalid_request"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Authentication => "authentication",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::RequestTooLarge => "request_too_large",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Overloaded => "overloaded",
            Self::Timeout => "timeout",
            Self::Conflict => "conflict",
            Self::Unknown => "unknown",
        }
    }

    /// Returns whether a status check failing with this code may be repeated
    /// at the next poll tick.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError | Self::Overloaded | Self::Timeout | Self::Conflict
        )
    }

    /// Returns the category: `"client"`, `"rate"`, `"server"`, `"operational"`, or `"unknown"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest
            | Self::Authentication
            | Self::PermissionDenied
            | Self::NotFound
            | Self::RequestTooLarge => "client",
            Self::RateLimited => "rate",
            Self::ServerError | Self::Overloaded | Self::Timeout => "server",
            Self::Conflict => "operational",
            Self::Unknown => "unknown",
        }
    }

    /// Maps an HTTP status code (or an envelope `status`) to the most likely code.
    ///
    /// Every 5xx without a dedicated mapping is treated as a server error.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::InvalidRequest,
            401 => Self::Authentication,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            408 => Self::Timeout,
            409 => Self::Conflict,
            413 => Self::RequestTooLarge,
            429 => Self::RateLimited,
            502 | 503 => Self::Overloaded,
            504 => Self::Timeout,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for StandardErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
