//! Chat-completion client for the matching model.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use formfill_core::Settings;

use crate::MatchError;
use crate::prompt::Prompt;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A model provider that can answer one instruction payload with a single
/// text completion. Implemented by [`OpenAiClient`] in production and by
/// [`mock::MockModel`](crate::mock::MockModel) in tests.
pub trait ModelClient: Send + Sync {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
        api_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, MatchError>> + Send + 'a>>;
}

/// OpenAI-compatible chat-completions client.
///
/// Temperature is pinned near-deterministic and output tokens are bounded;
/// both come from [`Settings`] so deployments can tune them.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(settings: &Settings) -> Result<Self, MatchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MatchError::Connectivity(e.to_string()))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    /// Point at a different OpenAI-compatible endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn complete_inner(&self, prompt: &Prompt, api_key: &str) -> Result<String, MatchError> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MatchError::Connectivity(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(MatchError::Auth),
            StatusCode::TOO_MANY_REQUESTS => return Err(MatchError::RateLimited),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(MatchError::Processing(format!(
                    "provider returned {status}: {body}"
                )));
            }
            _ => {}
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MatchError::Processing(format!("unreadable provider response: {e}")))?;

        // Absent content is treated like an empty completion; the matcher
        // degrades it to empty mappings.
        Ok(body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

impl ModelClient for OpenAiClient {
    fn complete<'a>(
        &'a self,
        prompt: &'a Prompt,
        api_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, MatchError>> + Send + 'a>> {
        Box::pin(self.complete_inner(prompt, api_key))
    }
}
