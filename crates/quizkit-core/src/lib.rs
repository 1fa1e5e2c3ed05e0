//! quizkit-core — Quiz session state machine, answer grading, and result
//! reconciliation.
//!
//! This crate holds the client-side quiz logic that the HTTP client and CLI
//! build on. It performs no I/O of its own; network access goes through the
//! [`traits::QuizApi`] collaborator.

pub mod comparator;
pub mod error;
pub mod model;
pub mod reconciler;
pub mod scoring;
pub mod session;
pub mod traits;
