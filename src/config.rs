//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Bot configuration, assembled from the environment at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot API token.
    pub telegram_token: String,
    /// Telegram user ids allowed to talk to the bot. Empty means open.
    pub allowed_users: Vec<String>,
    /// Base URL of the OpenAI-compatible generation endpoint.
    pub api_base: String,
    /// API key for the generation endpoint.
    pub api_key: SecretString,
    /// Model identifier passed through to the endpoint.
    pub model: String,
    /// Path of the append-only profile CSV.
    pub profile_path: PathBuf,
    /// Session idle timeout (sessions are pruned after this duration).
    pub session_idle_timeout: Duration,
}

impl BotConfig {
    /// Read configuration from the environment.
    ///
    /// `TELEGRAM_BOT_TOKEN` and `NUTRIBOT_API_KEY` are required; everything
    /// else has a sensible default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram_token = require_var("TELEGRAM_BOT_TOKEN")?;
        let api_key = SecretString::from(require_var("NUTRIBOT_API_KEY")?);

        let allowed_users = std::env::var("TELEGRAM_ALLOWED_USERS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let api_base = std::env::var("NUTRIBOT_API_BASE")
            .unwrap_or_else(|_| "https://models.inference.ai.azure.com".to_string());
        let model = std::env::var("NUTRIBOT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let profile_path = std::env::var("NUTRIBOT_PROFILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/profiles.csv"));

        let session_idle_timeout = match std::env::var("NUTRIBOT_SESSION_IDLE_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "NUTRIBOT_SESSION_IDLE_SECS".to_string(),
                message: format!("expected an integer number of seconds, got {raw:?}"),
            })?),
            Err(_) => Duration::from_secs(3600),
        };

        Ok(Self {
            telegram_token,
            allowed_users,
            api_base,
            api_key,
            model,
            profile_path,
            session_idle_timeout,
        })
    }
}

fn require_var(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}
