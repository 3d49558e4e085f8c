//! OpenAI-compatible chat-completions client over reqwest.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::GenerationError;
use crate::llm::GenerationClient;

/// Sampling temperature for plan generation.
const TEMPERATURE: f64 = 0.7;

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_base: String,
    api_key: SecretString,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(api_base: impl Into<String>, api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn request_body(&self, system_instructions: &str, user_prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "messages": [
                { "role": "system", "content": system_instructions },
                { "role": "user", "content": user_prompt },
            ],
        })
    }
}

#[async_trait]
impl GenerationClient for ChatCompletionsClient {
    async fn complete(
        &self,
        system_instructions: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError> {
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(system_instructions, user_prompt))
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed {
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::RequestFailed {
                reason: format!("service returned {status}: {body}"),
            });
        }

        let data: serde_json::Value =
            resp.json().await.map_err(|e| GenerationError::InvalidResponse {
                reason: format!("non-JSON completion response: {e}"),
            })?;

        let content = data
            .get("choices")
            .and_then(serde_json::Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| GenerationError::InvalidResponse {
                reason: "completion response has no choices[0].message.content".into(),
            })?;

        tracing::debug!(
            model = %self.model,
            chars = content.len(),
            "Generation call completed"
        );
        Ok(content.to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
