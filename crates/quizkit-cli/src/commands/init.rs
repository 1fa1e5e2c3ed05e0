//! The `quizkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizkit.toml").exists() {
        println!("quizkit.toml already exists, skipping.");
    } else {
        std::fs::write("quizkit.toml", SAMPLE_CONFIG)?;
        println!("Created quizkit.toml");
    }

    std::fs::create_dir_all("quizzes")?;
    let example_path = std::path::Path::new("quizzes/example.json");
    if example_path.exists() {
        println!("quizzes/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUIZ)?;
        println!("Created quizzes/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizkit.toml with your server URL and token");
    println!("  2. Run: quizkit validate --quiz-file quizzes/example.json");
    println!("  3. Run: quizkit take --quiz-file quizzes/example.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizkit configuration

base_url = "http://localhost:8080"
timeout_secs = 30
token = "${QUIZKIT_TOKEN}"

# "compatible" matches the server grader; "strict" requires exact set equality
grading_policy = "compatible"
send_answers = true
"#;

const EXAMPLE_QUIZ: &str = r#"{
  "id": 1,
  "title": "Everyday English",
  "description": "Greetings and polite expressions",
  "difficulty": 1,
  "maxScore": 2,
  "numberOfItems": 2,
  "questions": [
    {
      "id": 1,
      "page": 1,
      "type": "identification",
      "title": "What do you say when you meet someone in the morning?",
      "choices": ["Good morning", "Good night", "Goodbye"],
      "correct_answer": "Good morning"
    },
    {
      "id": 2,
      "page": 2,
      "type": "multiple_choice",
      "title": "Which words are polite?",
      "choices": ["please", "thank you", "whatever"],
      "correct_answer": ["please", "thank you"]
    }
  ]
}
"#;
