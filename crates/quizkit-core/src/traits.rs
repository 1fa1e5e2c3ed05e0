//! Collaborator traits.
//!
//! The quiz core never performs I/O itself. `quizkit-client` implements
//! [`QuizApi`] over HTTP; tests use in-memory implementations.

use async_trait::async_trait;

use crate::model::{Badge, Quiz, QuizResult, SubmissionRequest};

/// The remote quiz service.
///
/// Failures should carry a [`crate::error::ApiError`] so callers can classify
/// them with `downcast_ref`.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Fetch a quiz including its questions.
    async fn get_quiz(&self, quiz_id: &str) -> anyhow::Result<Quiz>;

    /// Mark the start of an attempt.
    async fn start_quiz(&self, quiz_id: &str) -> anyhow::Result<()>;

    /// Submit a finished attempt and receive the authoritative result.
    async fn submit_quiz(
        &self,
        quiz_id: &str,
        request: &SubmissionRequest,
    ) -> anyhow::Result<QuizResult>;

    /// Look up a badge for result display.
    async fn get_badge(&self, badge_id: &str) -> anyhow::Result<Badge>;
}
