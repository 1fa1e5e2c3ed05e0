//! Answer comparison.
//!
//! All comparisons trim surrounding whitespace and ignore case on both sides.
//! A [`CorrectAnswer::Malformed`] value, or one whose shape does not fit the
//! comparison, never matches.

use serde::{Deserialize, Serialize};

use crate::model::{CorrectAnswer, Question, QuestionKind};

/// How multiple-choice selections are compared with the correct set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingPolicy {
    /// Sizes must match and every selection must appear in the correct set.
    /// Duplicate selections can pass (`["dog","dog"]` vs `{"dog","cat"}`);
    /// this is what the server-side grader accepts.
    #[default]
    Compatible,
    /// Normalized selections must equal the correct set exactly.
    Strict,
}

/// Trim surrounding whitespace and lowercase.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

pub fn is_correct_identification(user_answer: &str, correct: &CorrectAnswer) -> bool {
    match correct {
        CorrectAnswer::Identification(expected) => normalize(user_answer) == normalize(expected),
        _ => false,
    }
}

pub fn is_correct_multiple_choice<S: AsRef<str>>(
    user_answers: &[S],
    correct: &CorrectAnswer,
    policy: GradingPolicy,
) -> bool {
    let CorrectAnswer::MultipleChoice(expected) = correct else {
        return false;
    };
    let expected: Vec<String> = expected.iter().map(|e| normalize(e)).collect();
    let given: Vec<String> = user_answers.iter().map(|u| normalize(u.as_ref())).collect();

    match policy {
        GradingPolicy::Compatible => {
            given.len() == expected.len() && given.iter().all(|g| expected.contains(g))
        }
        GradingPolicy::Strict => {
            let mut given = given;
            let mut expected = expected;
            given.sort();
            given.dedup();
            expected.sort();
            expected.dedup();
            given == expected
        }
    }
}

/// Grade the in-progress selection for a question, as shown during reveal.
///
/// Identification additionally requires exactly one selection.
pub fn is_selection_correct<S: AsRef<str>>(
    question: &Question,
    selected: &[S],
    policy: GradingPolicy,
) -> bool {
    match question.kind {
        QuestionKind::MultipleChoice => {
            is_correct_multiple_choice(selected, &question.correct_answer, policy)
        }
        QuestionKind::Identification => match selected {
            [only] => is_correct_identification(only.as_ref(), &question.correct_answer),
            _ => false,
        },
    }
}
