//! The quiz-taking state machine.
//!
//! A [`QuizSession`] walks one learner through one attempt:
//!
//! ```text
//! Overview --start()--> InProgress --advance() on last question--> Result
//!     ^                                                              |
//!     +---------------------------- reset() -------------------------+
//! ```
//!
//! Mutations take `&mut self`, so a session is driven by one caller at a time.
//! The two network calls (`start` and the final submission) only touch state
//! after they resolve. Dropping either future cancels it and leaves the session
//! exactly as it was.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::instrument;
use uuid::Uuid;

use crate::comparator::{is_selection_correct, GradingPolicy};
use crate::error::SessionError;
use crate::model::{Question, QuestionKind, Quiz, QuizResult, RecordedAnswers, SubmissionRequest};
use crate::reconciler::{QuizResultReconciler, ReconciledResult};
use crate::scoring::{compute_score, ANSWER_SEPARATOR};
use crate::traits::QuizApi;

/// Where the session is in the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Overview,
    InProgress,
    Result,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Overview => write!(f, "in overview"),
            Phase::InProgress => write!(f, "in progress"),
            Phase::Result => write!(f, "showing result"),
        }
    }
}

/// Notifications for whoever owns the session, e.g. to refresh chapter progress.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { quiz_id: String, attempt_id: Uuid },
    Completed { quiz_id: String, result: ReconciledResult },
}

/// Per-session settings.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub policy: GradingPolicy,
    /// Include the recorded answers in the submission body.
    pub send_answers: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: GradingPolicy::Compatible,
            send_answers: true,
        }
    }
}

/// State of one quiz attempt.
pub struct QuizSession {
    quiz: Quiz,
    api: Arc<dyn QuizApi>,
    config: SessionConfig,
    phase: Phase,
    current_index: usize,
    selected: Vec<String>,
    recorded: RecordedAnswers,
    reveal: bool,
    reconciler: QuizResultReconciler,
    attempt_id: Uuid,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl QuizSession {
    pub fn new(quiz: Quiz, api: Arc<dyn QuizApi>, config: SessionConfig) -> Self {
        Self {
            quiz,
            api,
            config,
            phase: Phase::Overview,
            current_index: 0,
            selected: Vec::new(),
            recorded: RecordedAnswers::new(),
            reveal: false,
            reconciler: QuizResultReconciler::new(),
            attempt_id: Uuid::new_v4(),
            started_at: None,
            finished_at: None,
            last_error: None,
            events: None,
        }
    }

    /// Fetch the quiz and create a session for it.
    pub async fn load(
        api: Arc<dyn QuizApi>,
        quiz_id: &str,
        config: SessionConfig,
    ) -> anyhow::Result<Self> {
        let quiz = api.get_quiz(quiz_id).await?;
        let malformed = quiz.malformed_questions().count();
        tracing::info!(
            quiz_id,
            questions = quiz.questions.len(),
            malformed,
            "loaded quiz"
        );
        Ok(Self::new(quiz, api, config))
    }

    /// Send lifecycle events to `events`. A closed receiver is ignored.
    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Begin the attempt. The phase only changes if the server accepts the start.
    #[instrument(skip(self), fields(quiz_id = %self.quiz.id, attempt_id = %self.attempt_id))]
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Overview {
            return Err(SessionError::InvalidPhase {
                action: "start",
                actual: self.phase,
            });
        }

        let api = Arc::clone(&self.api);
        if let Err(e) = api.start_quiz(&self.quiz.id).await {
            return Err(self.fail(e));
        }

        self.phase = Phase::InProgress;
        self.current_index = 0;
        self.selected.clear();
        self.recorded.clear();
        self.reveal = false;
        self.started_at = Some(Utc::now());
        self.last_error = None;
        tracing::info!("attempt started");
        self.emit(SessionEvent::Started {
            quiz_id: self.quiz.id.clone(),
            attempt_id: self.attempt_id,
        });
        Ok(())
    }

    /// Toggle (multiple choice) or set (identification) a choice.
    ///
    /// Ignored outside `InProgress` and while the answer is revealed.
    pub fn select_answer(&mut self, choice: &str) {
        if self.phase != Phase::InProgress || self.reveal {
            return;
        }
        let Some(kind) = self.current_question().map(|q| q.kind) else {
            return;
        };

        match kind {
            QuestionKind::MultipleChoice => {
                if let Some(pos) = self.selected.iter().position(|s| s == choice) {
                    self.selected.remove(pos);
                } else {
                    self.selected.push(choice.to_string());
                }
            }
            QuestionKind::Identification => {
                self.selected = vec![choice.to_string()];
            }
        }
    }

    /// Record the current selection and enter the reveal phase.
    ///
    /// Submitting again before advancing overwrites the recorded answer.
    pub fn submit_answer(&mut self) {
        if self.phase != Phase::InProgress {
            return;
        }
        let Some(question) = self.current_question() else {
            return;
        };

        if let Some(id) = question.id.clone() {
            let joined = self.selected.join(ANSWER_SEPARATOR);
            tracing::debug!(question_id = %id, answer = %joined, "answer recorded");
            self.recorded.insert(id, joined);
        }
        self.reveal = true;
    }

    /// Move to the next question, or submit the attempt after the last one.
    ///
    /// A failed submission keeps the session `InProgress` with every recorded
    /// answer intact; call [`QuizSession::retry_submit`] or `advance` again.
    #[instrument(skip(self), fields(quiz_id = %self.quiz.id, attempt_id = %self.attempt_id))]
    pub async fn advance(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::InProgress {
            return Err(SessionError::InvalidPhase {
                action: "advance",
                actual: self.phase,
            });
        }

        if !self.is_last_question() {
            self.clear_selection();
            self.current_index += 1;
            return Ok(());
        }

        self.finish().await
    }

    /// Re-send the final submission after a failure.
    pub async fn retry_submit(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::InProgress || !self.is_last_question() {
            return Err(SessionError::InvalidPhase {
                action: "retry submission",
                actual: self.phase,
            });
        }
        self.finish().await
    }

    /// Return to the overview with a fresh attempt.
    pub fn reset(&mut self) {
        self.phase = Phase::Overview;
        self.current_index = 0;
        self.selected.clear();
        self.recorded.clear();
        self.reveal = false;
        self.reconciler.clear();
        self.attempt_id = Uuid::new_v4();
        self.started_at = None;
        self.finished_at = None;
        self.last_error = None;
    }

    /// Show a result obtained earlier, e.g. when revisiting a completed quiz.
    pub fn show_completed(&mut self, result: QuizResult) {
        self.reconciler.set_completed(result);
        self.clear_selection();
        self.phase = Phase::Result;
    }

    async fn finish(&mut self) -> Result<(), SessionError> {
        let score = compute_score(&self.quiz, &self.recorded, self.config.policy);
        let request = SubmissionRequest {
            score,
            answers: self.config.send_answers.then(|| self.recorded.clone()),
        };
        tracing::info!(score, answered = self.recorded.len(), "submitting attempt");

        let api = Arc::clone(&self.api);
        let outcome = api.submit_quiz(&self.quiz.id, &request).await;
        self.clear_selection();

        match outcome {
            Ok(server) => {
                let reconciled = self.reconciler.reconcile(score, server).clone();
                self.phase = Phase::Result;
                self.finished_at = Some(Utc::now());
                self.last_error = None;
                tracing::info!(
                    score = reconciled.result.score,
                    max_score = reconciled.result.max_score,
                    badge_awarded = reconciled.result.badge_awarded,
                    "attempt completed"
                );
                self.emit(SessionEvent::Completed {
                    quiz_id: self.quiz.id.clone(),
                    result: reconciled,
                });
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, error: anyhow::Error) -> SessionError {
        tracing::error!("quiz request failed: {error:#}");
        self.last_error = Some(format!("{error:#}"));
        SessionError::Api(error)
    }

    fn clear_selection(&mut self) {
        self.reveal = false;
        self.selected.clear();
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions.get(self.current_index)
    }

    /// True on the final question, and for a quiz with no questions.
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.quiz.questions.len()
    }

    pub fn selected_answers(&self) -> &[String] {
        &self.selected
    }

    pub fn recorded_answers(&self) -> &RecordedAnswers {
        &self.recorded
    }

    pub fn is_revealed(&self) -> bool {
        self.reveal
    }

    /// Whether the current selection is right, for the reveal display.
    pub fn current_answer_correct(&self) -> bool {
        self.current_question()
            .map(|q| is_selection_correct(q, &self.selected, self.config.policy))
            .unwrap_or(false)
    }

    /// (answered, total) question counts.
    pub fn progress(&self) -> (usize, usize) {
        (self.recorded.len(), self.quiz.questions.len())
    }

    pub fn result(&self) -> Option<&ReconciledResult> {
        self.reconciler.result()
    }

    pub fn reconciler(&self) -> &QuizResultReconciler {
        &self.reconciler
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::model::Badge;
    use async_trait::async_trait;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Echoes the submitted score back; failures can be switched on.
    #[derive(Default)]
    struct FakeApi {
        fail_start: AtomicBool,
        fail_submit: AtomicBool,
        hang_submit: AtomicBool,
        submissions: Mutex<Vec<SubmissionRequest>>,
    }

    #[async_trait]
    impl QuizApi for FakeApi {
        async fn get_quiz(&self, quiz_id: &str) -> anyhow::Result<Quiz> {
            Ok(Quiz::new(quiz_id, "Loaded", sample_questions()))
        }

        async fn start_quiz(&self, _: &str) -> anyhow::Result<()> {
            if self.fail_start.load(Ordering::Relaxed) {
                return Err(ApiError::Status {
                    status: 500,
                    message: "boom".into(),
                }
                .into());
            }
            Ok(())
        }

        async fn submit_quiz(
            &self,
            _: &str,
            request: &SubmissionRequest,
        ) -> anyhow::Result<QuizResult> {
            if self.hang_submit.load(Ordering::Relaxed) {
                futures::future::pending::<()>().await;
            }
            if self.fail_submit.load(Ordering::Relaxed) {
                return Err(ApiError::Network("connection reset".into()).into());
            }
            self.submissions.lock().unwrap().push(request.clone());
            Ok(QuizResult {
                score: request.score,
                max_score: 3,
                is_eligible_for_retake: request.score < 3,
                is_eligible_for_badge: false,
                badge: None,
                badge_awarded: false,
            })
        }

        async fn get_badge(&self, badge_id: &str) -> anyhow::Result<Badge> {
            Err(ApiError::NotFound(badge_id.to_string()).into())
        }
    }

    fn sample_questions() -> Vec<Question> {
        vec![
            Question::identification("q1", "Capital?", &["Paris", "Rome"], "Paris"),
            Question::multiple_choice("q2", "Pets?", &["dog", "cat"], &["dog", "cat"]),
            Question::multiple_choice("q3", "Colors?", &["red", "blue"], &["red", "blue"]),
        ]
    }

    fn session(api: &Arc<FakeApi>) -> QuizSession {
        let api: Arc<dyn QuizApi> = api.clone();
        QuizSession::new(
            Quiz::new("quiz-1", "Basics", sample_questions()),
            api,
            SessionConfig::default(),
        )
    }

    async fn answer(session: &mut QuizSession, choices: &[&str]) {
        for c in choices {
            session.select_answer(c);
        }
        session.submit_answer();
        session.advance().await.unwrap();
    }

    #[tokio::test]
    async fn full_attempt_reaches_result() {
        let api = Arc::new(FakeApi::default());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut s = session(&api).with_events(tx);

        s.start().await.unwrap();
        assert_eq!(s.phase(), Phase::InProgress);
        assert!(s.started_at().is_some());

        answer(&mut s, &["Paris"]).await;
        answer(&mut s, &["dog", "cow"]).await;
        assert_eq!(s.current_index(), 2);
        answer(&mut s, &["blue", "red"]).await;

        assert_eq!(s.phase(), Phase::Result);
        let result = s.result().unwrap();
        assert_eq!(result.result.score, 2);
        assert!(!result.score_mismatch);

        let sent = api.submissions.lock().unwrap();
        assert_eq!(sent[0].score, 2);
        let answers = sent[0].answers.as_ref().unwrap();
        assert_eq!(answers["q2"], "dog,cow");
        assert_eq!(answers["q3"], "blue,red");

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Started { .. })));
        match rx.try_recv() {
            Ok(SessionEvent::Completed { quiz_id, result }) => {
                assert_eq!(quiz_id, "quiz-1");
                assert_eq!(result.result.score, 2);
            }
            other => panic!("expected Completed event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_start_stays_in_overview() {
        let api = Arc::new(FakeApi::default());
        api.fail_start.store(true, Ordering::Relaxed);
        let mut s = session(&api);

        let err = s.start().await.unwrap_err();
        assert!(matches!(err.api_error(), Some(ApiError::Status { status: 500, .. })));
        assert_eq!(s.phase(), Phase::Overview);
        assert!(s.last_error().unwrap().contains("500"));

        api.fail_start.store(false, Ordering::Relaxed);
        s.start().await.unwrap();
        assert_eq!(s.phase(), Phase::InProgress);
        assert!(s.last_error().is_none());
    }

    #[tokio::test]
    async fn multiple_choice_toggles_and_identification_replaces() {
        let api = Arc::new(FakeApi::default());
        let mut s = session(&api);
        s.start().await.unwrap();

        s.select_answer("Rome");
        s.select_answer("Paris");
        assert_eq!(s.selected_answers(), ["Paris"]);
        s.submit_answer();
        s.advance().await.unwrap();

        s.select_answer("dog");
        s.select_answer("cat");
        s.select_answer("dog");
        assert_eq!(s.selected_answers(), ["cat"]);
    }

    #[tokio::test]
    async fn selection_is_locked_during_reveal() {
        let api = Arc::new(FakeApi::default());
        let mut s = session(&api);
        s.start().await.unwrap();

        s.select_answer("Paris");
        s.submit_answer();
        assert!(s.is_revealed());
        assert!(s.current_answer_correct());

        s.select_answer("Rome");
        assert_eq!(s.selected_answers(), ["Paris"]);
    }

    #[tokio::test]
    async fn resubmission_before_advance_overwrites() {
        let api = Arc::new(FakeApi::default());
        let mut s = session(&api);
        s.start().await.unwrap();

        s.select_answer("Rome");
        s.submit_answer();
        s.submit_answer();
        assert_eq!(s.recorded_answers().len(), 1);
        assert_eq!(s.recorded_answers()["q1"], "Rome");
    }

    #[tokio::test]
    async fn selection_ignored_before_start() {
        let api = Arc::new(FakeApi::default());
        let mut s = session(&api);
        s.select_answer("Paris");
        s.submit_answer();
        assert!(s.selected_answers().is_empty());
        assert!(s.recorded_answers().is_empty());
        assert!(matches!(
            s.advance().await,
            Err(SessionError::InvalidPhase { actual: Phase::Overview, .. })
        ));
    }

    #[tokio::test]
    async fn failed_submission_preserves_answers() {
        let api = Arc::new(FakeApi::default());
        api.fail_submit.store(true, Ordering::Relaxed);
        let mut s = session(&api);
        s.start().await.unwrap();

        answer(&mut s, &["Paris"]).await;
        answer(&mut s, &["dog", "cat"]).await;
        s.select_answer("red");
        s.submit_answer();
        let err = s.advance().await.unwrap_err();

        assert!(err.api_error().unwrap().is_retryable());
        assert_eq!(s.phase(), Phase::InProgress);
        assert_eq!(s.recorded_answers().len(), 3);
        assert!(s.result().is_none());
        assert!(s.last_error().unwrap().contains("connection reset"));

        api.fail_submit.store(false, Ordering::Relaxed);
        s.retry_submit().await.unwrap();
        assert_eq!(s.phase(), Phase::Result);
        assert_eq!(s.result().unwrap().result.score, 2);
    }

    #[tokio::test]
    async fn dropped_submission_leaves_state_untouched() {
        let api = Arc::new(FakeApi::default());
        api.hang_submit.store(true, Ordering::Relaxed);
        let mut s = session(&api);
        s.start().await.unwrap();

        answer(&mut s, &["Paris"]).await;
        answer(&mut s, &["dog", "cat"]).await;
        s.select_answer("red");
        s.submit_answer();

        assert!(s.advance().now_or_never().is_none());

        assert_eq!(s.phase(), Phase::InProgress);
        assert!(s.is_revealed());
        assert_eq!(s.selected_answers(), ["red"]);
        assert_eq!(s.recorded_answers().len(), 3);
        assert!(api.submissions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_from_result_returns_to_overview() {
        let api = Arc::new(FakeApi::default());
        let mut s = session(&api);
        let first_attempt = s.attempt_id();
        s.start().await.unwrap();
        answer(&mut s, &["Paris"]).await;
        answer(&mut s, &["dog", "cat"]).await;
        answer(&mut s, &["red", "blue"]).await;
        assert_eq!(s.phase(), Phase::Result);

        s.reset();
        assert_eq!(s.phase(), Phase::Overview);
        assert!(s.recorded_answers().is_empty());
        assert_eq!(s.current_index(), 0);
        assert!(s.result().is_none());
        assert_ne!(s.attempt_id(), first_attempt);
    }

    #[tokio::test]
    async fn show_completed_forces_result() {
        let api = Arc::new(FakeApi::default());
        let mut s = session(&api);
        s.show_completed(QuizResult {
            score: 3,
            max_score: 3,
            is_eligible_for_retake: false,
            is_eligible_for_badge: false,
            badge: None,
            badge_awarded: true,
        });
        assert_eq!(s.phase(), Phase::Result);
        assert_eq!(s.result().unwrap().local_score, None);
        assert!(api.submissions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn answers_omitted_when_disabled() {
        let api = Arc::new(FakeApi::default());
        let dyn_api: Arc<dyn QuizApi> = api.clone();
        let mut s = QuizSession::new(
            Quiz::new("quiz-1", "Single", vec![sample_questions().remove(0)]),
            dyn_api,
            SessionConfig {
                send_answers: false,
                ..SessionConfig::default()
            },
        );
        s.start().await.unwrap();
        answer(&mut s, &["paris "]).await;
        let sent = api.submissions.lock().unwrap();
        assert_eq!(sent[0].score, 1);
        assert!(sent[0].answers.is_none());
    }

    #[tokio::test]
    async fn empty_quiz_submits_zero() {
        let api = Arc::new(FakeApi::default());
        let dyn_api: Arc<dyn QuizApi> = api.clone();
        let mut s = QuizSession::new(
            Quiz::new("empty", "Empty", vec![]),
            dyn_api,
            SessionConfig::default(),
        );
        s.start().await.unwrap();
        s.select_answer("anything");
        s.submit_answer();
        assert!(s.recorded_answers().is_empty());
        s.advance().await.unwrap();
        assert_eq!(s.result().unwrap().result.score, 0);
    }

    #[tokio::test]
    async fn load_fetches_quiz() {
        let api: Arc<dyn QuizApi> = Arc::new(FakeApi::default());
        let s = QuizSession::load(api, "remote-1", SessionConfig::default())
            .await
            .unwrap();
        assert_eq!(s.quiz().id, "remote-1");
        assert_eq!(s.progress(), (0, 3));
    }
}
