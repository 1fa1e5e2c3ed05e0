//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result};

use quizkit_core::model::{CorrectAnswer, Quiz};

pub mod badge;
pub mod grade;
pub mod init;
pub mod take;
pub mod validate;

/// Read a quiz in the server's JSON format.
pub fn load_quiz_file(path: &Path) -> Result<Quiz> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse quiz file: {}", path.display()))
}

/// Human-readable form of a correct answer.
pub fn describe_answer(answer: &CorrectAnswer) -> String {
    match answer {
        CorrectAnswer::Identification(s) => s.clone(),
        CorrectAnswer::MultipleChoice(items) => items.join(", "),
        CorrectAnswer::Malformed => "(unavailable)".to_string(),
    }
}
