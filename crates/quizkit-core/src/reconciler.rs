//! Reconciliation of the locally computed score with the server's verdict.
//!
//! The server result is what gets displayed. The local score is kept alongside
//! it only to flag disagreements between client and server grading.

use serde::Serialize;

use crate::model::{Badge, Quiz, QuizResult};
use crate::traits::QuizApi;

/// The result exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledResult {
    /// Authoritative result from the server.
    pub result: QuizResult,
    /// Score computed on the client, absent for reviewed past attempts.
    pub local_score: Option<u32>,
    /// Client and server disagreed on the score.
    pub score_mismatch: bool,
}

/// Holds the final result of an attempt. Once set it does not change until
/// [`QuizResultReconciler::clear`].
#[derive(Debug, Default)]
pub struct QuizResultReconciler {
    current: Option<ReconciledResult>,
}

impl QuizResultReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the server result of a fresh submission.
    pub fn reconcile(&mut self, local_score: u32, server: QuizResult) -> &ReconciledResult {
        let score_mismatch = local_score != server.score;
        if score_mismatch {
            tracing::warn!(
                local_score,
                server_score = server.score,
                "local score differs from server result, displaying server result"
            );
        }
        self.set(ReconciledResult {
            result: server,
            local_score: Some(local_score),
            score_mismatch,
        })
    }

    /// Install a previously obtained result for read-only review.
    pub fn set_completed(&mut self, result: QuizResult) -> &ReconciledResult {
        self.set(ReconciledResult {
            result,
            local_score: None,
            score_mismatch: false,
        })
    }

    fn set(&mut self, candidate: ReconciledResult) -> &ReconciledResult {
        if self.current.is_some() {
            tracing::warn!("result already set, ignoring new result");
        }
        self.current.get_or_insert(candidate)
    }

    pub fn result(&self) -> Option<&ReconciledResult> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Badge to show on the result screen.
    ///
    /// Nothing unless the server says the badge was awarded. The server also
    /// embeds the quiz's badge in results that did not earn it. Uses the
    /// embedded badge when present, otherwise looks up the quiz's badge.
    /// Read-only.
    pub async fn badge_to_display(
        &self,
        quiz: &Quiz,
        api: &dyn QuizApi,
    ) -> anyhow::Result<Option<Badge>> {
        let Some(current) = &self.current else {
            return Ok(None);
        };
        if !current.result.badge_awarded {
            return Ok(None);
        }
        if let Some(badge) = &current.result.badge {
            return Ok(Some(badge.clone()));
        }
        match &quiz.badge_id {
            Some(badge_id) => api.get_badge(badge_id).await.map(Some),
            None => Ok(None),
        }
    }
}
