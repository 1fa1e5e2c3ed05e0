//! Error types for quiz API calls and session transitions.
//!
//! `ApiError` lives in `quizkit-core` so the session can downcast failures from
//! any `QuizApi` implementation and classify them without string matching.

use thiserror::Error;

use crate::session::Phase;

/// Errors that can occur when talking to the quiz API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The bearer token was missing, expired, or rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The quiz or badge does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned some other non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Returns `true` if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors returned by `QuizSession` transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transition is not allowed from the current phase.
    #[error("cannot {action} while {actual}")]
    InvalidPhase { action: &'static str, actual: Phase },

    /// The API call behind the transition failed. The session state is unchanged.
    #[error("{0:#}")]
    Api(#[source] anyhow::Error),
}

impl SessionError {
    /// The underlying API error, if the failure came from the collaborator.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api(e) => e.downcast_ref::<ApiError>(),
            SessionError::InvalidPhase { .. } => None,
        }
    }
}
