//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use std::time::Duration;
use thiserror::Error;

/// Default user message for a terminal load failure.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while loading the data. Please try again later.";

/// User message when the last attempt was aborted by the request timeout.
pub const TIMEOUT_FAILURE_MESSAGE: &str =
    "The request is taking too long. Please try again later.";

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Statistics API error: {0}")]
    StatsApi(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("UI error: {0}")]
    Ui(String),

    #[error(transparent)]
    Load(#[from] LoadFailure),
}

/// Why a single datamart attempt failed. Every variant is retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The request was aborted because it outlived the request timeout.
    #[error("request aborted after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Network-level failure (connect, reset, TLS, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    /// The body is not JSON or does not have the expected shape.
    #[error("invalid datamart payload: {0}")]
    Validation(String),
}

impl AttemptFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptFailure::Timeout(_))
    }
}

/// Terminal failure after every attempt was used. Cloned to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("datamart could not be loaded after {attempts} attempts: {cause}")]
pub struct LoadFailure {
    pub attempts: u32,
    /// Failure of the last attempt, preserved for diagnostics.
    pub cause: AttemptFailure,
    pub user_message: String,
    /// View the caller should offer as a way out.
    pub recovery_hint: String,
}

impl LoadFailure {
    pub fn exhausted(attempts: u32, cause: AttemptFailure, recovery_hint: impl Into<String>) -> Self {
        let user_message = if cause.is_timeout() {
            TIMEOUT_FAILURE_MESSAGE
        } else {
            GENERIC_FAILURE_MESSAGE
        };
        Self {
            attempts,
            cause,
            user_message: user_message.to_string(),
            recovery_hint: recovery_hint.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_gets_specific_message() {
        let f = LoadFailure::exhausted(4, AttemptFailure::Timeout(Duration::from_secs(30)), "/home");
        assert_eq!(f.user_message, TIMEOUT_FAILURE_MESSAGE);
        assert_eq!(f.recovery_hint, "/home");
        assert_eq!(f.attempts, 4);
    }

    #[test]
    fn test_other_causes_get_generic_message() {
        let causes = [
            AttemptFailure::Transport("connection reset".into()),
            AttemptFailure::Status {
                status: 503,
                reason: "Service Unavailable".into(),
            },
            AttemptFailure::Validation("missing companies".into()),
        ];
        for cause in causes {
            let f = LoadFailure::exhausted(1, cause, "/home");
            assert_eq!(f.user_message, GENERIC_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn test_display_keeps_root_cause() {
        let f = LoadFailure::exhausted(
            2,
            AttemptFailure::Status {
                status: 502,
                reason: "Bad Gateway".into(),
            },
            "/home",
        );
        assert_eq!(
            f.to_string(),
            "datamart could not be loaded after 2 attempts: HTTP 502 Bad Gateway"
        );
    }
}
