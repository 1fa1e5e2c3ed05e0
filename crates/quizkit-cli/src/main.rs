//! quizkit CLI — take, grade, and inspect quizzes from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use quizkit_core::comparator::GradingPolicy;

mod commands;

#[derive(Parser)]
#[command(name = "quizkit", version, about = "Quiz runner and grader for the learning platform")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz interactively
    Take {
        /// Quiz id on the server
        #[arg(long, required_unless_present = "quiz_file")]
        quiz: Option<String>,

        /// Practice offline with a quiz JSON file instead of the server
        #[arg(long, conflicts_with = "quiz")]
        quiz_file: Option<PathBuf>,

        /// Multiple-choice grading policy: compatible, strict
        #[arg(long, value_parser = parse_policy)]
        policy: Option<GradingPolicy>,

        /// Submission retries on transient failures
        #[arg(long, default_value = "2")]
        retries: u32,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade recorded answers against a quiz file
    Grade {
        /// Quiz JSON file (server format)
        #[arg(long)]
        quiz_file: PathBuf,

        /// Answers TOML file
        #[arg(long)]
        answers: PathBuf,

        /// Multiple-choice grading policy: compatible, strict
        #[arg(long, default_value = "compatible", value_parser = parse_policy)]
        policy: GradingPolicy,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check a quiz file for data problems
    Validate {
        /// Quiz JSON file (server format)
        #[arg(long)]
        quiz_file: PathBuf,
    },

    /// Look up badges
    Badge {
        /// Badge id
        id: Option<String>,

        /// List badges earned by the current learner
        #[arg(long)]
        mine: bool,

        /// List every badge
        #[arg(long)]
        all: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and example quiz
    Init,
}

fn parse_policy(s: &str) -> Result<GradingPolicy, String> {
    match s.to_lowercase().as_str() {
        "compatible" => Ok(GradingPolicy::Compatible),
        "strict" => Ok(GradingPolicy::Strict),
        other => Err(format!("unknown grading policy: {other}")),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizkit=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            quiz,
            quiz_file,
            policy,
            retries,
            config,
        } => commands::take::execute(quiz, quiz_file, policy, retries, config).await,
        Commands::Grade {
            quiz_file,
            answers,
            policy,
            format,
        } => commands::grade::execute(quiz_file, answers, policy, format),
        Commands::Validate { quiz_file } => commands::validate::execute(quiz_file),
        Commands::Badge {
            id,
            mine,
            all,
            config,
        } => commands::badge::execute(id, mine, all, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
