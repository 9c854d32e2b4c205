use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::traits::{LanguageModel, ModelEnv, ModelInfo, ModelProvider};
use crate::config::ModelConfig;
use crate::error::{Error, Result};

/// Default number of attempts per completion
pub const DEFAULT_RETRY_COUNT: u32 = 3;
/// Default delay between retries in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// OpenAI-compatible chat completion client.
/// Works with: OpenAI, Azure-style proxies, Ollama, llama.cpp server, etc.
pub struct OpenAiModel {
    client: Client,
    /// Base URL for the API (e.g., "https://api.openai.com/v1")
    pub api_base: String,
    api_key: String,
    /// Model identifier
    pub model: String,
    /// Number of attempts per completion
    pub retry_count: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Statuses worth another attempt; anything else fails immediately.
const fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

impl OpenAiModel {
    /// Create a new client for `env` using the connection settings in `config`.
    pub fn new(env: &ModelEnv, config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::ModelInit(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: env.api_key.clone(),
            model: env.model.clone(),
            retry_count: config.retry_count.max(1),
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    /// Make API request with retry logic
    async fn request_with_retry(&self, prompt: &str) -> Result<String> {
        let url = self.completions_url();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let mut last_error = None;

        for attempt in 0..self.retry_count {
            debug!(
                "Completion request attempt {}/{} to {}",
                attempt + 1,
                self.retry_count,
                url
            );

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    let chat_response = response
                        .json::<ChatResponse>()
                        .await
                        .map_err(|e| Error::ModelInvalidResponse(e.to_string()))?;

                    return chat_response
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.message.content)
                        .ok_or_else(|| {
                            Error::ModelInvalidResponse("No choices in response".to_string())
                        });
                }
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse().ok());

                    warn!("Rate limited, retry after {:?}s", retry_after);
                    last_error = Some(Error::ModelRateLimited { retry_after });

                    if attempt + 1 < self.retry_count {
                        let wait_time = retry_after.map_or(self.retry_delay_ms, |s: u64| s * 1000);
                        tokio::time::sleep(Duration::from_millis(wait_time)).await;
                    }
                    continue;
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    warn!("API error: {} - {}", status, body);
                    let err = Error::ModelRequest(format!("HTTP {status}: {body}"));
                    if !is_transient(status) {
                        return Err(err);
                    }
                    last_error = Some(err);
                }
                Err(e) => {
                    warn!("Request failed: {}", e);
                    if e.is_timeout() {
                        last_error = Some(Error::ModelTimeout);
                    } else {
                        last_error = Some(Error::ModelRequest(e.to_string()));
                    }
                }
            }

            if attempt + 1 < self.retry_count {
                tokio::time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
            }
        }

        error!("Completion failed after {} attempts", self.retry_count);
        Err(last_error.unwrap_or(Error::ModelMaxRetriesExceeded))
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: "OpenAI Compatible",
            model: self.model.clone(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.request_with_retry(prompt).await
    }
}

/// Builds [`OpenAiModel`] clients that share one set of connection settings.
#[derive(Debug, Clone, Default)]
pub struct OpenAiProvider {
    config: ModelConfig,
}

impl OpenAiProvider {
    pub const fn new(config: ModelConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    async fn create(&self, env: &ModelEnv) -> Result<Arc<dyn LanguageModel>> {
        debug!("Creating OpenAI model client for {}", env.model);
        Ok(Arc::new(OpenAiModel::new(env, &self.config)?))
    }
}
