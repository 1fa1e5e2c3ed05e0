//! The `quizkit validate` command.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;

use quizkit_core::model::Quiz;

use super::load_quiz_file;

/// A data problem found in a quiz.
struct QuizWarning {
    question_id: Option<String>,
    message: String,
}

fn check_quiz(quiz: &Quiz) -> Vec<QuizWarning> {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    if !(1..=5).contains(&quiz.difficulty.0) {
        warnings.push(QuizWarning {
            question_id: None,
            message: format!("difficulty {} is outside 1-5", quiz.difficulty.0),
        });
    }
    if quiz.question_count as usize != quiz.questions.len() {
        warnings.push(QuizWarning {
            question_id: None,
            message: format!(
                "numberOfItems is {} but {} questions are present",
                quiz.question_count,
                quiz.questions.len()
            ),
        });
    }

    for (i, q) in quiz.questions.iter().enumerate() {
        match &q.id {
            None => warnings.push(QuizWarning {
                question_id: None,
                message: format!("question #{} has no id and can never be scored", i + 1),
            }),
            Some(id) if !seen.insert(id.clone()) => warnings.push(QuizWarning {
                question_id: Some(id.clone()),
                message: "duplicate question id".into(),
            }),
            Some(_) => {}
        }
        if q.correct_answer.is_malformed() {
            warnings.push(QuizWarning {
                question_id: q.id.clone(),
                message: format!("correct_answer does not fit a {} question", q.kind),
            });
        }
    }

    warnings
}

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let quiz = load_quiz_file(&quiz_path)?;
    println!("Quiz: {} ({} questions)", quiz.title, quiz.questions.len());

    let warnings = check_quiz(&quiz);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Quiz is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
