//! Single stateless client for the upstream chat-completion endpoint, with
//! exponential-backoff retry on transient failures.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct RawChatResponse {
    choices: Vec<RawChoice>,
    usage: Option<RawUsage>,
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    message: RawMessage,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Thin, stateless wrapper over a shared `reqwest::Client`. Concurrent
/// callers share no per-call state; rate limiting is the swarm engine's job.
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    referrer: Option<String>,
    max_retries: u32,
    base_backoff: Duration,
    max_backoff: Duration,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .build()
            .expect("reqwest client builds with default TLS backend");
        Self {
            http,
            base_url: config.upstream_base_url.clone(),
            api_key: config.upstream_api_key.clone(),
            referrer: config.upstream_referrer.clone(),
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let scaled = self.base_backoff.saturating_mul(1u32 << attempt.min(20));
        scaled.min(self.max_backoff)
    }

    fn is_retryable(status: Option<reqwest::StatusCode>, transport_error: bool) -> bool {
        if transport_error {
            return true;
        }
        match status {
            Some(s) => s.as_u16() == 429 || s.is_server_error(),
            None => false,
        }
    }

    /// Issue one chat-completion call, retrying transient failures with
    /// exponential backoff. Aborts early if `cancel` fires.
    pub async fn call(&self, request: &ChatRequest, cancel: &CancellationToken) -> CoreResult<ChatResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| CoreError::Internal("UPSTREAM_API_KEY is not set".to_string()))?;

        let mut last_error = String::new();
        let mut last_retry_after: Option<u64> = None;

        for attempt in 0..=self.max_retries {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }

            let mut builder = self
                .http
                .post(&self.base_url)
                .bearer_auth(api_key)
                .json(request);
            if let Some(referrer) = &self.referrer {
                builder = builder.header("HTTP-Referer", referrer);
            }

            let send_result = tokio::select! {
                res = builder.send() => res,
                _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            };

            match send_result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed: RawChatResponse = response
                            .json()
                            .await
                            .map_err(|e| CoreError::UpstreamFailed(format!("malformed response body: {e}")))?;
                        let choice = parsed
                            .choices
                            .into_iter()
                            .next()
                            .ok_or_else(|| CoreError::UpstreamFailed("no choices in response".to_string()))?;
                        let usage = parsed.usage.unwrap_or_default();
                        return Ok(ChatResponse {
                            content: choice.message.content.unwrap_or_default(),
                            prompt_tokens: usage.prompt_tokens,
                            completion_tokens: usage.completion_tokens,
                        });
                    }

                    let retryable = Self::is_retryable(Some(status), false);
                    let body = response.text().await.unwrap_or_default();
                    last_error = format!("HTTP {status}: {body}");

                    if status.as_u16() == 429 {
                        last_retry_after = Some(self.backoff_for(attempt).as_secs());
                    }

                    if !retryable || attempt == self.max_retries {
                        break;
                    }
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt == self.max_retries {
                        break;
                    }
                }
            }

            let backoff = self.backoff_for(attempt);
            warn!(attempt = attempt + 1, max_retries = self.max_retries, backoff_secs = backoff.as_secs(), error = %last_error, "upstream call failed, retrying");
            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            }
        }

        if let Some(retry_after_secs) = last_retry_after {
            Err(CoreError::RateLimited { retry_after_secs })
        } else {
            Err(CoreError::UpstreamFailed(last_error))
        }
    }
}
