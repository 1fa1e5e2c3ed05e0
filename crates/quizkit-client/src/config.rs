//! Client configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizkit_core::comparator::GradingPolicy;
use quizkit_core::session::SessionConfig;

use crate::auth::{EnvToken, StaticToken, TokenSource, TOKEN_ENV_VAR};
use crate::http::{HttpQuizApi, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Top-level quizkit configuration.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct QuizkitConfig {
    /// Root of the platform API, without the `/api/v1` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Bearer token. When unset, `QUIZKIT_TOKEN` is read on every request.
    #[serde(default)]
    pub token: Option<String>,
    /// How multiple-choice answers are compared.
    #[serde(default)]
    pub grading_policy: GradingPolicy,
    /// Include per-question answers in the submission body.
    #[serde(default = "default_true")]
    pub send_answers: bool,
}

impl std::fmt::Debug for QuizkitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizkitConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("grading_policy", &self.grading_policy)
            .field("send_answers", &self.send_answers)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_true() -> bool {
    true
}

impl Default for QuizkitConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            token: None,
            grading_policy: GradingPolicy::default(),
            send_answers: true,
        }
    }
}

impl QuizkitConfig {
    /// Settings handed to each `QuizSession`.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            policy: self.grading_policy,
            send_answers: self.send_answers,
        }
    }

    /// The token source requests will await.
    pub fn token_source(&self) -> Arc<dyn TokenSource> {
        match &self.token {
            Some(token) if !token.is_empty() => Arc::new(StaticToken::new(token.clone())),
            _ => Arc::new(EnvToken::default()),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizkit.toml` in the current directory
/// 2. `~/.config/quizkit/config.toml`
///
/// Environment variable overrides: `QUIZKIT_BASE_URL`, `QUIZKIT_TOKEN`.
pub fn load_config() -> Result<QuizkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizkitConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizkit.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizkitConfig::default(),
    };

    if let Ok(url) = std::env::var("QUIZKIT_BASE_URL") {
        config.base_url = url;
    }
    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        config.token = Some(token);
    }

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Parse a TOML document and expand `${VAR}` references.
pub fn parse_config(content: &str) -> Result<QuizkitConfig> {
    let mut config: QuizkitConfig = toml::from_str(content)?;
    config.base_url = resolve_env_vars(&config.base_url);
    config.token = config.token.as_deref().map(resolve_env_vars);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizkit"))
}

/// Build the HTTP client described by `config`.
pub fn create_client(config: &QuizkitConfig) -> Result<HttpQuizApi> {
    anyhow::ensure!(config.timeout_secs > 0, "timeout_secs must be at least 1");
    HttpQuizApi::new(
        Some(config.base_url.clone()),
        config.timeout_secs,
        config.token_source(),
    )
}
