//! Error types for model provider requests.

use std::fmt;

use thiserror::Error;

/// Broad category of a failed model request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError,
    /// Other HTTP 4xx (bad key, unknown model, malformed request)
    ClientError,
    /// Connection failures and timeouts
    NetworkError,
    /// The provider answered, but not in the chat-completions shape
    ParseError,
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LlmErrorKind::RateLimited => "rate limited",
            LlmErrorKind::ServerError => "server error",
            LlmErrorKind::ClientError => "client error",
            LlmErrorKind::NetworkError => "network error",
            LlmErrorKind::ParseError => "parse error",
        };
        f.write_str(s)
    }
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        500..=599 => LlmErrorKind::ServerError,
        400..=499 => LlmErrorKind::ClientError,
        // Anything else reaching here was not a success either.
        _ => LlmErrorKind::ServerError,
    }
}

/// A failed request to the model provider.
#[derive(Debug, Clone, Error)]
#[error("{kind}{}: {message}", http_suffix(.status))]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

fn http_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" (HTTP {})", s))
        .unwrap_or_default()
}

impl LlmError {
    pub fn from_status(status: u16, body: String) -> Self {
        Self {
            kind: classify_http_status(status),
            status: Some(status),
            message: body,
        }
    }

    pub fn network_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::NetworkError,
            status: None,
            message,
        }
    }

    pub fn parse_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::ParseError,
            status: None,
            message,
        }
    }
}
