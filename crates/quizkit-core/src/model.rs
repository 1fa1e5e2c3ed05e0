//! Core data model types for quizkit.
//!
//! Quizzes arrive from the server with a dynamically typed `correct_answer`
//! (a JSON string or a JSON array). They are resolved once, at deserialization
//! time, into [`CorrectAnswer`] so grading never inspects raw JSON.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Answers recorded during an attempt: question id to comma-joined selection.
pub type RecordedAnswers = HashMap<String, String>;

/// Kind of a quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Identification,
    MultipleChoice,
}

impl QuestionKind {
    /// Map the wire `type` field. Anything other than `multiple_choice` is
    /// graded as identification, matching how the server treats it.
    fn from_wire(raw: Option<&str>, question_id: Option<&str>) -> Self {
        match raw {
            Some("multiple_choice") => QuestionKind::MultipleChoice,
            Some("identification") => QuestionKind::Identification,
            other => {
                tracing::warn!(
                    question_id = question_id.unwrap_or("<none>"),
                    question_type = other.unwrap_or("<none>"),
                    "unknown question type, treating as identification"
                );
                QuestionKind::Identification
            }
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Identification => write!(f, "identification"),
            QuestionKind::MultipleChoice => write!(f, "multiple_choice"),
        }
    }
}

/// The authoritative answer for a question, resolved against its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectAnswer {
    /// A single expected string.
    Identification(String),
    /// An unordered set of expected strings.
    MultipleChoice(Vec<String>),
    /// Shape did not match the question kind, or the value was absent.
    Malformed,
}

impl CorrectAnswer {
    fn resolve(kind: QuestionKind, raw: Option<serde_json::Value>) -> Self {
        use serde_json::Value;

        match (kind, raw) {
            (QuestionKind::Identification, Some(Value::String(s))) => {
                CorrectAnswer::Identification(s)
            }
            (QuestionKind::MultipleChoice, Some(Value::Array(items))) => {
                CorrectAnswer::MultipleChoice(
                    items
                        .into_iter()
                        .filter_map(|v| match v {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                )
            }
            _ => CorrectAnswer::Malformed,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, CorrectAnswer::Malformed)
    }
}

/// A single question within a quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Server identifier. Questions without one can be shown but never recorded.
    pub id: Option<String>,
    /// Display text.
    pub text: String,
    pub kind: QuestionKind,
    /// Choices offered to the learner, in display order.
    pub choices: Vec<String>,
    pub correct_answer: CorrectAnswer,
    /// Page index within the quiz.
    pub page: Option<u32>,
}

impl Question {
    /// Build an identification question.
    pub fn identification(id: &str, text: &str, choices: &[&str], answer: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            text: text.to_string(),
            kind: QuestionKind::Identification,
            choices: choices.iter().map(|c| c.to_string()).collect(),
            correct_answer: CorrectAnswer::Identification(answer.to_string()),
            page: None,
        }
    }

    /// Build a multiple-choice question.
    pub fn multiple_choice(id: &str, text: &str, choices: &[&str], answers: &[&str]) -> Self {
        Self {
            id: Some(id.to_string()),
            text: text.to_string(),
            kind: QuestionKind::MultipleChoice,
            choices: choices.iter().map(|c| c.to_string()).collect(),
            correct_answer: CorrectAnswer::MultipleChoice(
                answers.iter().map(|a| a.to_string()).collect(),
            ),
            page: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    choices: Option<Vec<String>>,
    #[serde(default, rename = "correct_answer")]
    correct_answer: Option<serde_json::Value>,
    #[serde(default)]
    page: Option<u32>,
}

impl From<WireQuestion> for Question {
    fn from(wire: WireQuestion) -> Self {
        let kind = QuestionKind::from_wire(wire.kind.as_deref(), wire.id.as_deref());
        let correct_answer = CorrectAnswer::resolve(kind, wire.correct_answer);
        if correct_answer.is_malformed() {
            tracing::warn!(
                question_id = wire.id.as_deref().unwrap_or("<none>"),
                %kind,
                "correct_answer does not match question type, question will never score"
            );
        }
        Self {
            id: wire.id,
            text: wire.title.unwrap_or_default(),
            kind,
            choices: wire.choices.unwrap_or_default(),
            correct_answer,
            page: wire.page,
        }
    }
}

impl<'de> Deserialize<'de> for Question {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        WireQuestion::deserialize(deserializer).map(Question::from)
    }
}

/// Quiz difficulty on a 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(pub u8);

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "Easy",
            2 => "Medium",
            3 => "Hard",
            4 => "Expert",
            5 => "Master",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A quiz with its questions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub chapter_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub difficulty: Difficulty,
    /// Number of items as advertised by the server.
    #[serde(default, rename = "numberOfItems", deserialize_with = "null_as_default")]
    pub question_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_score: u32,
    /// Badge awarded for completing this quiz, if any.
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub badge_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i32,
    #[serde(default, alias = "completed", deserialize_with = "null_as_default")]
    pub is_completed: bool,
    /// Ordered questions. Empty when the server did not include them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn new(id: &str, title: &str, questions: Vec<Question>) -> Self {
        let count = questions.len() as u32;
        Self {
            id: id.to_string(),
            chapter_id: None,
            title: title.to_string(),
            description: String::new(),
            difficulty: Difficulty(1),
            question_count: count,
            max_score: count,
            badge_id: None,
            order: 0,
            is_completed: false,
            questions,
        }
    }

    /// Questions whose correct answer could not be resolved at load time.
    pub fn malformed_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(|q| q.correct_answer.is_malformed())
    }
}

/// An awarded achievement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub date_obtained: Option<String>,
}

/// The server's verdict on a submitted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_score: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_eligible_for_retake: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_eligible_for_badge: bool,
    #[serde(default)]
    pub badge: Option<Badge>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub badge_awarded: bool,
}

impl QuizResult {
    /// Score as a fraction of the maximum, or 0 when the maximum is 0.
    pub fn ratio(&self) -> f64 {
        if self.max_score == 0 {
            0.0
        } else {
            self.score as f64 / self.max_score as f64
        }
    }
}

/// Body of `POST /api/v1/quizzes/{id}/submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<RecordedAnswers>,
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

/// Server ids are numeric; older payloads use strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Num(i64),
    Str(String),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Num(n) => n.to_string(),
            WireId::Str(s) => s,
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    WireId::deserialize(deserializer).map(String::from)
}

fn deserialize_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<WireId>::deserialize(deserializer)?.map(String::from))
}

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_labels() {
        assert_eq!(Difficulty(1).label(), "Easy");
        assert_eq!(Difficulty(3).to_string(), "Hard");
        assert_eq!(Difficulty(5).label(), "Master");
        assert_eq!(Difficulty(0).label(), "Unknown");
        assert_eq!(Difficulty(9).label(), "Unknown");
    }

    #[test]
    fn quiz_from_server_payload() {
        let json = serde_json::json!({
            "id": 12,
            "chapterId": 3,
            "title": "Animals",
            "description": "Pets and farm animals",
            "difficulty": 2,
            "maxScore": 2,
            "numberOfItems": 2,
            "badgeId": 7,
            "completed": true,
            "questions": [
                {"id": 100, "page": 1, "type": "identification", "title": "Capital of France?",
                 "choices": ["Paris", "Rome"], "correct_answer": "Paris"},
                {"id": "101", "page": 2, "type": "multiple_choice", "title": "Pets?",
                 "choices": ["dog", "cat", "cow"], "correct_answer": ["dog", "cat", 3]}
            ]
        });
        let quiz: Quiz = serde_json::from_value(json).unwrap();
        assert_eq!(quiz.id, "12");
        assert_eq!(quiz.chapter_id.as_deref(), Some("3"));
        assert_eq!(quiz.badge_id.as_deref(), Some("7"));
        assert!(quiz.is_completed);
        assert_eq!(quiz.difficulty.label(), "Medium");
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].text, "Capital of France?");
        assert_eq!(
            quiz.questions[0].correct_answer,
            CorrectAnswer::Identification("Paris".into())
        );
        assert_eq!(quiz.questions[1].id.as_deref(), Some("101"));
        assert_eq!(
            quiz.questions[1].correct_answer,
            CorrectAnswer::MultipleChoice(vec!["dog".into(), "cat".into()])
        );
    }

    #[test]
    fn mismatched_answer_shape_is_malformed() {
        let json = serde_json::json!({
            "id": "q",
            "isCompleted": null,
            "questions": [
                {"id": 1, "type": "identification", "correct_answer": ["a"]},
                {"id": 2, "type": "multiple_choice", "correct_answer": "a"},
                {"id": 3, "type": "multiple_choice"}
            ]
        });
        let quiz: Quiz = serde_json::from_value(json).unwrap();
        assert!(!quiz.is_completed);
        assert_eq!(quiz.malformed_questions().count(), 3);
    }

    #[test]
    fn missing_questions_are_empty() {
        let quiz: Quiz =
            serde_json::from_value(serde_json::json!({"id": 1, "questions": null})).unwrap();
        assert!(quiz.questions.is_empty());
    }

    #[test]
    fn unknown_type_falls_back_to_identification() {
        let q: Question = serde_json::from_value(serde_json::json!({
            "id": 5, "type": "essay", "correct_answer": "x"
        }))
        .unwrap();
        assert_eq!(q.kind, QuestionKind::Identification);
        assert_eq!(q.correct_answer, CorrectAnswer::Identification("x".into()));
    }

    #[test]
    fn submission_omits_absent_answers() {
        let req = SubmissionRequest {
            score: 3,
            answers: None,
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"score":3}"#);
    }

    #[test]
    fn result_tolerates_null_flags() {
        let result: QuizResult = serde_json::from_value(serde_json::json!({
            "score": 4, "maxScore": 5, "isEligibleForRetake": null,
            "isEligibleForBadge": true, "badge": {"id": 9, "name": "Starter"}
        }))
        .unwrap();
        assert!(!result.is_eligible_for_retake);
        assert!(result.is_eligible_for_badge);
        assert!(!result.badge_awarded);
        assert_eq!(result.badge.as_ref().unwrap().id, "9");
        assert!((result.ratio() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn quiz_tolerates_null_scalars() {
        let quiz: Quiz = serde_json::from_value(serde_json::json!({
            "id": 3, "chapterId": 1, "title": "Verbs", "description": null,
            "difficulty": null, "maxScore": 1, "numberOfItems": 1, "badgeId": null,
            "order": null, "completed": false,
            "questions": [{
                "id": 30, "page": 1, "type": "identification", "title": "Past of go?",
                "choices": ["went", "goed"], "correct_answer": "went"
            }]
        }))
        .unwrap();
        assert_eq!(quiz.title, "Verbs");
        assert_eq!(quiz.description, "");
        assert_eq!(quiz.difficulty, Difficulty(0));
        assert_eq!(quiz.order, 0);
        assert_eq!(quiz.badge_id, None);
        assert_eq!(quiz.questions.len(), 1);

        let quiz: Quiz = serde_json::from_value(serde_json::json!({
            "id": 4, "title": null, "maxScore": null, "numberOfItems": null
        }))
        .unwrap();
        assert_eq!(quiz.title, "");
        assert_eq!(quiz.max_score, 0);
        assert_eq!(quiz.question_count, 0);
    }
}
