//! The `quizkit badge` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizkit_client::config::{create_client, load_config_from};
use quizkit_core::model::Badge;
use quizkit_core::traits::QuizApi;

pub async fn execute(
    id: Option<String>,
    mine: bool,
    all: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        id.is_some() || mine || all,
        "pass a badge id, --mine, or --all"
    );

    let config = load_config_from(config_path.as_deref())?;
    let client = create_client(&config)?;

    if let Some(id) = &id {
        let badge = client
            .get_badge(id)
            .await
            .with_context(|| format!("failed to fetch badge {id}"))?;
        print_badge(&badge);
    }

    let (earned, every) = futures::future::try_join(
        async {
            if mine {
                client.my_badges().await.map(Some)
            } else {
                Ok(None)
            }
        },
        async {
            if all {
                client.list_badges().await.map(Some)
            } else {
                Ok(None)
            }
        },
    )
    .await
    .context("failed to list badges")?;

    if let Some(earned) = earned {
        println!("Earned badges ({}):", earned.len());
        earned.iter().for_each(print_badge);
    }
    if let Some(every) = every {
        println!("All badges ({}):", every.len());
        every.iter().for_each(print_badge);
    }

    Ok(())
}

fn print_badge(badge: &Badge) {
    let name = badge.name.as_deref().unwrap_or("(unnamed)");
    let mut line = format!("  {} - {}", badge.id, name);
    if let Some(level) = &badge.level {
        line.push_str(&format!(" [{level}]"));
    }
    if let Some(date) = &badge.date_obtained {
        line.push_str(&format!(" obtained {date}"));
    }
    println!("{line}");
    if let Some(description) = &badge.description {
        println!("      {description}");
    }
}
