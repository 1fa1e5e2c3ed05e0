//! The `quizkit take` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use quizkit_client::config::{create_client, load_config_from};
use quizkit_client::LocalQuizApi;
use quizkit_core::comparator::GradingPolicy;
use quizkit_core::error::ApiError;
use quizkit_core::model::{Question, QuestionKind};
use quizkit_core::session::{Phase, QuizSession, SessionEvent};
use quizkit_core::traits::QuizApi;

use super::{describe_answer, load_quiz_file};

const RETRY_DELAY: Duration = Duration::from_millis(500);

pub async fn execute(
    quiz_id: Option<String>,
    quiz_file: Option<PathBuf>,
    policy: Option<GradingPolicy>,
    retries: u32,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let mut session_config = config.session_config();
    if let Some(policy) = policy {
        session_config.policy = policy;
    }

    let (api, quiz_id): (Arc<dyn QuizApi>, String) = match (quiz_file, quiz_id) {
        (Some(path), _) => {
            let quiz = load_quiz_file(&path)?;
            let id = quiz.id.clone();
            eprintln!("Practicing offline from {}", path.display());
            (Arc::new(LocalQuizApi::new().with_quiz(quiz)), id)
        }
        (None, Some(id)) => (Arc::new(create_client(&config)?), id),
        (None, None) => anyhow::bail!("either --quiz or --quiz-file is required"),
    };

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut session = QuizSession::load(Arc::clone(&api), &quiz_id, session_config)
        .await
        .with_context(|| format!("failed to load quiz {quiz_id}"))?
        .with_events(events_tx);

    print_overview(&session);
    if session.quiz().questions.is_empty() {
        println!("This quiz has no questions yet.");
        return Ok(());
    }

    session.start().await.context("failed to start quiz")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while session.phase() == Phase::InProgress {
        let Some(question) = session.current_question().cloned() else {
            break;
        };
        print_question(&session, &question);

        let Some(line) = lines.next_line().await? else {
            println!("\nAttempt abandoned.");
            return Ok(());
        };
        for choice in parse_selection(&question, &line) {
            session.select_answer(&choice);
        }
        session.submit_answer();

        if session.current_answer_correct() {
            println!("Correct!");
        } else {
            println!(
                "Incorrect. Answer: {}",
                describe_answer(&question.correct_answer)
            );
        }

        submit_with_retries(&mut session, retries).await?;
    }

    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Completed { quiz_id, .. } = event {
            tracing::info!(%quiz_id, "quiz completed, chapter progress needs refresh");
        }
    }

    print_result(&session, api.as_ref()).await;
    Ok(())
}

/// Advance, re-sending the final submission on transient failures.
async fn submit_with_retries(session: &mut QuizSession, retries: u32) -> Result<()> {
    let mut outcome = session.advance().await;
    let mut remaining = retries;

    while let Err(e) = outcome {
        let retryable = e.api_error().is_some_and(ApiError::is_retryable);
        if !retryable || remaining == 0 {
            return Err(e).context("failed to submit quiz");
        }
        eprintln!("Submission failed: {e}. Retrying...");
        remaining -= 1;
        tokio::time::sleep(RETRY_DELAY).await;
        outcome = session.retry_submit().await;
    }
    Ok(())
}

/// Turn a typed line into choices. Numbers pick from the listed choices;
/// multiple-choice selections are comma separated.
fn parse_selection(question: &Question, line: &str) -> Vec<String> {
    let resolve = |token: &str| -> String {
        let token = token.trim();
        token
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| question.choices.get(i))
            .cloned()
            .unwrap_or_else(|| token.to_string())
    };

    match question.kind {
        QuestionKind::Identification => vec![resolve(line)],
        QuestionKind::MultipleChoice => line
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(resolve)
            .collect(),
    }
}

fn print_overview(session: &QuizSession) {
    let quiz = session.quiz();
    println!("{}", quiz.title);
    if !quiz.description.is_empty() {
        println!("{}", quiz.description);
    }
    println!(
        "Difficulty: {} | Questions: {} | Max score: {}",
        quiz.difficulty,
        quiz.questions.len(),
        quiz.max_score
    );
    if quiz.is_completed {
        println!("You have already completed this quiz.");
    }
}

fn print_question(session: &QuizSession, question: &Question) {
    println!(
        "\nQuestion {}/{}: {}",
        session.current_index() + 1,
        session.quiz().questions.len(),
        question.text
    );
    for (i, choice) in question.choices.iter().enumerate() {
        println!("  {}. {}", i + 1, choice);
    }
    if question.kind == QuestionKind::MultipleChoice {
        println!("(select all that apply, comma separated)");
    }
}

async fn print_result(session: &QuizSession, api: &dyn QuizApi) {
    let Some(reconciled) = session.result() else {
        return;
    };
    let result = &reconciled.result;
    println!(
        "\nScore: {}/{} ({:.0}%)",
        result.score,
        result.max_score,
        result.ratio() * 100.0
    );
    if result.is_eligible_for_retake {
        println!("You can retake this quiz to improve your score.");
    }

    match session.reconciler().badge_to_display(session.quiz(), api).await {
        Ok(Some(badge)) => println!(
            "Badge earned: {}",
            badge.name.as_deref().unwrap_or(badge.id.as_str())
        ),
        Ok(None) if result.is_eligible_for_badge => {
            println!("Score higher to earn this quiz's badge.")
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("could not load badge: {e:#}"),
    }
}
