//! quizkit-client — HTTP access to the learning platform's quiz API.
//!
//! Implements the `QuizApi` trait from `quizkit-core` over REST, plus an
//! in-process implementation for offline use and tests.

pub mod auth;
pub mod config;
pub mod http;
pub mod local;

pub use auth::{EnvToken, StaticToken, TokenSource};
pub use config::{create_client, load_config, load_config_from, QuizkitConfig};
pub use http::HttpQuizApi;
pub use local::LocalQuizApi;
pub use quizkit_core::error::ApiError;
