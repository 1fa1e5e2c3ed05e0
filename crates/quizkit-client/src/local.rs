//! In-process quiz API.
//!
//! Serves quizzes from memory and grades submissions with the platform's
//! rules, so sessions can be driven without a server: offline practice in the
//! CLI, and tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizkit_core::error::ApiError;
use quizkit_core::model::{Badge, Quiz, QuizResult, SubmissionRequest};
use quizkit_core::traits::QuizApi;

/// Fraction of the maximum score needed to complete a quiz and earn its badge.
pub const PASS_RATIO: f64 = 0.8;

/// A [`QuizApi`] backed by in-memory quizzes and badges.
#[derive(Default)]
pub struct LocalQuizApi {
    quizzes: HashMap<String, Quiz>,
    badges: HashMap<String, Badge>,
    /// Quizzes with a start call not yet followed by a submission.
    started: Mutex<HashSet<String>>,
    /// When set, every call fails with a network error.
    offline: AtomicBool,
    call_count: AtomicU32,
    last_submission: Mutex<Option<SubmissionRequest>>,
}

impl LocalQuizApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quiz(mut self, quiz: Quiz) -> Self {
        self.quizzes.insert(quiz.id.clone(), quiz);
        self
    }

    pub fn with_badge(mut self, badge: Badge) -> Self {
        self.badges.insert(badge.id.clone(), badge);
        self
    }

    /// Simulate losing (or regaining) connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Number of API calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last submission received.
    pub fn last_submission(&self) -> Option<SubmissionRequest> {
        self.last_submission
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn enter(&self) -> Result<(), ApiError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.offline.load(Ordering::Relaxed) {
            return Err(ApiError::Network("offline".into()));
        }
        Ok(())
    }

    fn quiz(&self, quiz_id: &str) -> Result<&Quiz, ApiError> {
        self.quizzes
            .get(quiz_id)
            .ok_or_else(|| ApiError::NotFound(format!("quizzes/{quiz_id}")))
    }
}

#[async_trait]
impl QuizApi for LocalQuizApi {
    async fn get_quiz(&self, quiz_id: &str) -> anyhow::Result<Quiz> {
        self.enter()?;
        Ok(self.quiz(quiz_id)?.clone())
    }

    async fn start_quiz(&self, quiz_id: &str) -> anyhow::Result<()> {
        self.enter()?;
        self.quiz(quiz_id)?;
        self.started
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(quiz_id.to_string());
        Ok(())
    }

    async fn submit_quiz(
        &self,
        quiz_id: &str,
        request: &SubmissionRequest,
    ) -> anyhow::Result<QuizResult> {
        self.enter()?;
        let quiz = self.quiz(quiz_id)?;

        let was_started = self
            .started
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(quiz_id);
        if !was_started {
            return Err(ApiError::Status {
                status: 400,
                message: "Cannot submit a quiz that hasn't been started".into(),
            }
            .into());
        }
        *self
            .last_submission
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        let passed = request.score as f64 >= quiz.max_score as f64 * PASS_RATIO;
        let badge = quiz
            .badge_id
            .as_ref()
            .and_then(|id| self.badges.get(id))
            .cloned();
        let badge_awarded = passed && quiz.badge_id.is_some();

        Ok(QuizResult {
            score: request.score,
            max_score: quiz.max_score,
            is_eligible_for_retake: !passed,
            is_eligible_for_badge: !badge_awarded && quiz.badge_id.is_some(),
            badge,
            badge_awarded,
        })
    }

    async fn get_badge(&self, badge_id: &str) -> anyhow::Result<Badge> {
        self.enter()?;
        self.badges
            .get(badge_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("badges/{badge_id}")).into())
    }
}
