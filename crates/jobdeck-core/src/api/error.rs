//! Typed errors for the request pipeline and the stores built on it.
//!
//! Every failure the core can surface is classified into one of these kinds
//! so callers can decide between re-prompting, retrying, and giving up
//! without string-matching messages.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of API errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Invalid credentials. Recoverable by re-prompting the user.
    Auth,
    /// The session was rejected with 401. The local session has been torn
    /// down and the user must log in again.
    SessionExpired,
    /// Timeout or unreachable host, retryable at the caller's discretion.
    /// Never retried automatically (blind retry is unsafe for writes).
    Network,
    /// The server rejected the request as malformed (400/422). Not retryable.
    Validation,
    /// Persistence layer failure (credential store, config file).
    Storage,
    /// Server-side failure (403, 5xx) surfaced unmodified.
    Server,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Auth => write!(f, "auth"),
            ApiErrorKind::SessionExpired => write!(f, "session_expired"),
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Validation => write!(f, "validation"),
            ApiErrorKind::Storage => write!(f, "storage"),
            ApiErrorKind::Server => write!(f, "server"),
        }
    }
}

/// Structured error with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new error.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Classifies an HTTP status, extracting a cleaner message from a JSON
    /// `{"message": ...}` body when the server provides one.
    ///
    /// `authenticated` distinguishes a rejected token (session expiry) from a
    /// rejected login attempt (invalid credentials): both arrive as 401.
    pub fn from_status(status: u16, body: &str, authenticated: bool) -> Self {
        let kind = match status {
            401 if authenticated => ApiErrorKind::SessionExpired,
            401 => ApiErrorKind::Auth,
            400 | 422 => ApiErrorKind::Validation,
            _ => ApiErrorKind::Server,
        };

        let message = match extract_server_message(body) {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };
        let details = if body.is_empty() {
            None
        } else {
            Some(body.to_string())
        };

        Self {
            kind,
            message,
            details,
        }
    }

    /// Classifies a transport-level failure from reqwest.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "could not reach the server".to_string()
        } else {
            format!("network error: {err}")
        };
        Self::new(ApiErrorKind::Network, message)
    }

    /// Creates a network error (also used for undecodable response bodies,
    /// which are treated like transient transport failures).
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Storage, message)
    }

    /// Returns true if this error means the user must authenticate again.
    pub fn is_session_expired(&self) -> bool {
        self.kind == ApiErrorKind::SessionExpired
    }
}

/// Pulls a human-readable message out of a JSON error body, if any.
fn extract_server_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("message")
        .or_else(|| json.get("error").and_then(|e| e.get("message")))
        .and_then(Value::as_str)
        .map(std::string::ToString::to_string)
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for core operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
