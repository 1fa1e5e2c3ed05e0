//! Bearer token sources.
//!
//! The HTTP client awaits a [`TokenSource`] before dispatching each request.
//! Token storage and refresh stay with whoever implements the trait.

use async_trait::async_trait;

/// Environment variable read by [`EnvToken::default`].
pub const TOKEN_ENV_VAR: &str = "QUIZKIT_TOKEN";

/// Supplies the bearer token for outgoing requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The current token, or `None` to send the request unauthenticated.
    async fn token(&self) -> anyhow::Result<Option<String>>;
}

/// A fixed token.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"***").finish()
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> anyhow::Result<Option<String>> {
        Ok(Some(self.0.clone()))
    }
}

/// Reads the token from an environment variable on every request, so a
/// rotated token is picked up without rebuilding the client.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

#[async_trait]
impl TokenSource for EnvToken {
    async fn token(&self) -> anyhow::Result<Option<String>> {
        Ok(std::env::var(&self.var).ok().filter(|t| !t.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_is_masked_in_debug() {
        let token = StaticToken::new("secret-jwt");
        assert_eq!(token.token().await.unwrap().as_deref(), Some("secret-jwt"));
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[tokio::test]
    async fn env_token_reads_lazily() {
        let source = EnvToken::new("_QUIZKIT_TEST_TOKEN");
        std::env::remove_var("_QUIZKIT_TEST_TOKEN");
        assert!(source.token().await.unwrap().is_none());

        std::env::set_var("_QUIZKIT_TEST_TOKEN", "rotated");
        assert_eq!(source.token().await.unwrap().as_deref(), Some("rotated"));

        std::env::set_var("_QUIZKIT_TEST_TOKEN", "");
        assert!(source.token().await.unwrap().is_none());
        std::env::remove_var("_QUIZKIT_TEST_TOKEN");
    }
}
