//! Fetch error taxonomy.
//!
//! Every failure the API collaborator can produce is folded into one of four
//! kinds before it reaches the controller. Errors are `Clone` so the
//! controller can keep the last one around for display and retry.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Connectivity or transport failure
    Network,
    /// 401 / 403
    Auth,
    /// 5xx, unexpected status, or a body that does not match the envelope
    Server,
    Timeout,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Network => write!(f, "network error"),
            FetchErrorKind::Auth => write!(f, "authentication error"),
            FetchErrorKind::Server => write!(f, "server error"),
            FetchErrorKind::Timeout => write!(f, "timeout"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
    /// HTTP status code, if the failure came from a response
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Auth, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Server, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Timeout, message)
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        let message = format!("HTTP {} {}", status.as_u16(), reason);
        let kind = match status.as_u16() {
            401 | 403 => FetchErrorKind::Auth,
            408 | 504 => FetchErrorKind::Timeout,
            _ => FetchErrorKind::Server,
        };
        Self {
            kind,
            message,
            status: Some(status.as_u16()),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status);
        }

        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if err.is_decode() || err.is_body() {
            FetchErrorKind::Server
        } else {
            FetchErrorKind::Network
        };
        Self::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let cases = [
            (401, FetchErrorKind::Auth),
            (403, FetchErrorKind::Auth),
            (500, FetchErrorKind::Server),
            (502, FetchErrorKind::Server),
            (404, FetchErrorKind::Server),
            (504, FetchErrorKind::Timeout),
        ];
        for (code, expected) in cases {
            let status = reqwest::StatusCode::from_u16(code).unwrap();
            let err = FetchError::from_status(status);
            assert_eq!(err.kind, expected, "status {code}");
            assert_eq!(err.status, Some(code));
        }
    }

    #[test]
    fn test_display_includes_kind() {
        let err = FetchError::network("connection refused");
        assert_eq!(err.to_string(), "network error: connection refused");
    }
}
