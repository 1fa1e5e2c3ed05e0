//! REST implementation of [`QuizApi`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::instrument;

use quizkit_core::error::ApiError;
use quizkit_core::model::{Badge, Quiz, QuizResult, SubmissionRequest};
use quizkit_core::traits::QuizApi;

use crate::auth::TokenSource;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the quiz and badge endpoints.
pub struct HttpQuizApi {
    base_url: String,
    timeout_secs: u64,
    tokens: Arc<dyn TokenSource>,
    client: reqwest::Client,
}

impl HttpQuizApi {
    pub fn new(
        base_url: Option<String>,
        timeout_secs: u64,
        tokens: Arc<dyn TokenSource>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            tokens,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    /// Attach the bearer token, send, and map failures onto [`ApiError`].
    async fn send(&self, request: RequestBuilder, resource: &str) -> anyhow::Result<Response> {
        let request = match self.tokens.token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout_secs)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = match status.as_u16() {
            401 | 403 => ApiError::Unauthorized(body),
            404 => ApiError::NotFound(resource.to_string()),
            code => ApiError::Status {
                status: code,
                message: body,
            },
        };
        Err(err.into())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()).into())
    }

    /// All badges defined on the platform.
    #[instrument(skip(self))]
    pub async fn list_badges(&self) -> anyhow::Result<Vec<Badge>> {
        let response = self
            .send(self.client.get(self.url("badges")), "badges")
            .await?;
        Self::decode(response).await
    }

    /// Badges earned by the authenticated learner.
    #[instrument(skip(self))]
    pub async fn my_badges(&self) -> anyhow::Result<Vec<Badge>> {
        let response = self
            .send(self.client.get(self.url("badges/my")), "badges/my")
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    #[instrument(skip(self))]
    async fn get_quiz(&self, quiz_id: &str) -> anyhow::Result<Quiz> {
        let path = format!("quizzes/{quiz_id}");
        let response = self.send(self.client.get(self.url(&path)), &path).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self))]
    async fn start_quiz(&self, quiz_id: &str) -> anyhow::Result<()> {
        let path = format!("quizzes/{quiz_id}/start");
        self.send(self.client.post(self.url(&path)), &path).await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(score = request.score))]
    async fn submit_quiz(
        &self,
        quiz_id: &str,
        request: &SubmissionRequest,
    ) -> anyhow::Result<QuizResult> {
        let path = format!("quizzes/{quiz_id}/submit");
        let response = self
            .send(self.client.post(self.url(&path)).json(request), &path)
            .await?;
        Self::decode(response).await
    }

    #[instrument(skip(self))]
    async fn get_badge(&self, badge_id: &str) -> anyhow::Result<Badge> {
        let path = format!("badges/{badge_id}");
        let response = self.send(self.client.get(self.url(&path)), &path).await?;
        Self::decode(response).await
    }
}
