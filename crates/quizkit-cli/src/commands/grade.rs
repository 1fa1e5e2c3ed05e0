//! The `quizkit grade` command.
//!
//! Answers file format:
//!
//! ```toml
//! [answers]
//! "101" = "Paris"
//! "102" = ["dog", "cat"]
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use quizkit_core::comparator::GradingPolicy;
use quizkit_core::model::RecordedAnswers;
use quizkit_core::scoring::{grade, GradeReport, Outcome, ANSWER_SEPARATOR};

use super::load_quiz_file;

#[derive(Deserialize)]
struct AnswersFile {
    #[serde(default)]
    answers: HashMap<String, AnswerValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerValue {
    One(String),
    Many(Vec<String>),
}

impl AnswerValue {
    fn into_recorded(self) -> String {
        match self {
            AnswerValue::One(s) => s,
            AnswerValue::Many(items) => items.join(ANSWER_SEPARATOR),
        }
    }
}

fn load_answers(path: &Path) -> Result<RecordedAnswers> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;
    let file: AnswersFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse answers file: {}", path.display()))?;
    Ok(file
        .answers
        .into_iter()
        .map(|(id, value)| (id, value.into_recorded()))
        .collect())
}

pub fn execute(
    quiz_path: PathBuf,
    answers_path: PathBuf,
    policy: GradingPolicy,
    format: String,
) -> Result<()> {
    let quiz = load_quiz_file(&quiz_path)?;
    let recorded = load_answers(&answers_path)?;

    let report = grade(&quiz, &recorded, policy);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_table(&report, quiz.max_score),
        other => anyhow::bail!("unknown format: {other}"),
    }

    Ok(())
}

fn print_table(report: &GradeReport, max_score: u32) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Type", "Answer", "Result"]);

    for q in &report.questions {
        let outcome = match q.outcome {
            Outcome::Correct => "correct",
            Outcome::Incorrect => "incorrect",
            Outcome::Unanswered => "unanswered",
            Outcome::Malformed => "malformed",
        };
        table.add_row(vec![
            Cell::new(q.question_id.as_deref().unwrap_or("-")),
            Cell::new(q.kind),
            Cell::new(q.answer.as_deref().unwrap_or("")),
            Cell::new(outcome),
        ]);
    }

    println!("{table}");
    println!(
        "Score: {}/{} ({} questions, policy: {:?})",
        report.correct(),
        max_score,
        report.questions.len(),
        report.policy
    );
}
