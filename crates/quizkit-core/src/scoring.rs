//! Score calculation from recorded answers.

use serde::{Deserialize, Serialize};

use crate::comparator::{is_correct_identification, is_correct_multiple_choice, GradingPolicy};
use crate::model::{Question, QuestionKind, Quiz, RecordedAnswers};

/// Separator used when a selection is recorded as a single string.
pub const ANSWER_SEPARATOR: &str = ",";

/// Outcome for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    Unanswered,
    /// The question's correct answer could not be resolved; it never scores.
    Malformed,
}

/// Per-question grading detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionGrade {
    pub question_id: Option<String>,
    pub kind: QuestionKind,
    pub answer: Option<String>,
    pub outcome: Outcome,
}

/// Full grading breakdown for a quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    pub quiz_id: String,
    pub policy: GradingPolicy,
    pub questions: Vec<QuestionGrade>,
}

impl GradeReport {
    pub fn correct(&self) -> u32 {
        self.count(Outcome::Correct)
    }

    pub fn count(&self, outcome: Outcome) -> u32 {
        self.questions.iter().filter(|q| q.outcome == outcome).count() as u32
    }
}

/// Count correctly answered questions.
///
/// Questions without an id or without a recorded answer contribute nothing.
pub fn compute_score(quiz: &Quiz, recorded: &RecordedAnswers, policy: GradingPolicy) -> u32 {
    quiz.questions
        .iter()
        .filter(|q| grade_question(q, recorded, policy) == Outcome::Correct)
        .count() as u32
}

/// Grade every question and keep the per-question outcome.
pub fn grade(quiz: &Quiz, recorded: &RecordedAnswers, policy: GradingPolicy) -> GradeReport {
    let questions = quiz
        .questions
        .iter()
        .map(|q| QuestionGrade {
            question_id: q.id.clone(),
            kind: q.kind,
            answer: q.id.as_ref().and_then(|id| recorded.get(id)).cloned(),
            outcome: grade_question(q, recorded, policy),
        })
        .collect();

    GradeReport {
        quiz_id: quiz.id.clone(),
        policy,
        questions,
    }
}

fn grade_question(
    question: &Question,
    recorded: &RecordedAnswers,
    policy: GradingPolicy,
) -> Outcome {
    let Some(answer) = question.id.as_ref().and_then(|id| recorded.get(id)) else {
        return Outcome::Unanswered;
    };
    if question.correct_answer.is_malformed() {
        return Outcome::Malformed;
    }

    let correct = match question.kind {
        QuestionKind::MultipleChoice => {
            let parts: Vec<&str> = answer.split(ANSWER_SEPARATOR).collect();
            is_correct_multiple_choice(&parts, &question.correct_answer, policy)
        }
        QuestionKind::Identification => {
            is_correct_identification(answer, &question.correct_answer)
        }
    };

    tracing::debug!(
        question_id = question.id.as_deref().unwrap_or_default(),
        kind = %question.kind,
        answer = %answer,
        correct,
        "graded question"
    );

    if correct {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    }
}
