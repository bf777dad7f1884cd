//! Groq Provider Implementation
//!
//! Talks to a hosted chat-completions API. Groq exposes the OpenAI wire
//! format, so any compatible endpoint works.
//!
//! # Features
//!
//! - Async HTTP communication with the chat-completions endpoint
//! - Configurable endpoint, model and temperature
//! - Retry logic with exponential backoff
//! - Per-request timeout
//!
//! # Examples
//!
//! ```no_run
//! use projectbrain_llm::GroqProvider;
//!
//! let provider = GroqProvider::new(
//!     "https://api.groq.com/openai/v1",
//!     "llama-3.3-70b-versatile",
//!     "gsk_...",
//! ).unwrap();
//! ```

use crate::LlmError;
use projectbrain_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Groq API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// Default hosted model
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default timeout for a single request (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts per completion
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Longest a completion can take when every attempt times out
///
/// Counts `max_retries` request timeouts plus the 1s, 2s, 4s... backoff slept
/// between them.
pub fn worst_case_duration(timeout: Duration, max_retries: u32) -> Duration {
    let attempts = max_retries.max(1);
    let backoff_secs = 2u64.saturating_pow(attempts - 1).saturating_sub(1);
    timeout
        .saturating_mul(attempts)
        .saturating_add(Duration::from_secs(backoff_secs))
}

/// Hosted chat-completions provider
pub struct GroqProvider {
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    timeout: Duration,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for the chat-completions API
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from the chat-completions API
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

impl GroqProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API base URL (e.g., "https://api.groq.com/openai/v1")
    /// - `model`: Model to use (e.g., "llama-3.3-70b-versatile")
    /// - `api_key`: Bearer token sent with every request
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Unauthorized("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            temperature: 0.0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Create a provider for the default Groq endpoint and model
    pub fn with_defaults(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, api_key)
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Upper bound on one `complete` call with the current settings
    pub fn max_call_duration(&self) -> Duration {
        worst_case_duration(self.timeout, self.max_retries)
    }

    /// Request a chat completion
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The API key is rejected
    /// - The model is not available
    /// - Every attempt fails with a network, rate-limit or server error
    /// - The response body is not a chat completion
    pub async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        // Retry logic with exponential backoff
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .timeout(self.timeout)
                .json(&request_body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.json::<ChatCompletionResponse>().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        return extract_content(body);
                    } else if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(LlmError::Unauthorized(format!("HTTP {}", status)));
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(LlmError::RateLimitExceeded);
                    } else if status.is_server_error() {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        return Err(LlmError::InvalidResponse(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!(attempt = attempts, ?delay, "LLM request failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }

    /// Run `complete` to completion from synchronous code
    ///
    /// Must be called from a blocking-pool thread or outside any runtime.
    fn complete_blocking(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Calling chat completions");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(self.complete(system, prompt)),
            Err(_) => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?
                .block_on(self.complete(system, prompt)),
        }
    }
}

fn extract_content(body: ChatCompletionResponse) -> Result<String, LlmError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("Response contained no choices".to_string()))
}

impl LlmProviderTrait for GroqProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.complete_blocking(None, prompt)
    }

    fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String, Self::Error> {
        self.complete_blocking(Some(system), prompt)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_provider_creation() {
        let provider = GroqProvider::new("https://api.example.com/v1/", "llama", "key").unwrap();
        assert_eq!(provider.endpoint, "https://api.example.com/v1");
        assert_eq!(provider.model, "llama");
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(provider.temperature, 0.0);
    }

    #[test]
    fn test_groq_provider_defaults() {
        let provider = GroqProvider::with_defaults("key").unwrap();
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model_name(), DEFAULT_MODEL);
    }

    #[test]
    fn test_groq_provider_rejects_empty_key() {
        let result = GroqProvider::with_defaults("  ");
        assert!(matches!(result, Err(LlmError::Unauthorized(_))));
    }

    #[test]
    fn test_groq_provider_builders() {
        let provider = GroqProvider::with_defaults("key")
            .unwrap()
            .with_temperature(0.7)
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(0);
        assert_eq!(provider.temperature, 0.7);
        assert_eq!(provider.timeout, Duration::from_secs(5));
        // At least one attempt is always made
        assert_eq!(provider.max_retries, 1);
        assert_eq!(provider.max_call_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_worst_case_duration() {
        // Three 60s attempts with 1s and 2s of backoff between them
        assert_eq!(
            worst_case_duration(Duration::from_secs(60), 3),
            Duration::from_secs(183)
        );
        assert_eq!(
            worst_case_duration(Duration::from_secs(10), 1),
            Duration::from_secs(10)
        );
        assert_eq!(
            worst_case_duration(Duration::from_secs(10), 0),
            Duration::from_secs(10)
        );
        assert_eq!(
            worst_case_duration(Duration::from_secs(1), u32::MAX),
            Duration::MAX
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "llama",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "Be brief.",
                },
                ChatMessage {
                    role: "user",
                    content: "Hi",
                },
            ],
            temperature: 0.0,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Hi");
        assert_eq!(value["temperature"], 0.0);
    }

    #[test]
    fn test_extract_content() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "[]"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(body).unwrap(), "[]");

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(extract_content(empty), Err(LlmError::InvalidResponse(_))));
    }

    // Integration tests (requires network access and GROQ_API_KEY)
    #[tokio::test]
    #[ignore] // Only run when the hosted API is reachable
    async fn test_groq_complete_integration() {
        let key = std::env::var("GROQ_API_KEY").unwrap_or_default();
        let provider = GroqProvider::with_defaults(key).unwrap();
        let response = provider
            .complete(None, "Say 'hello' and nothing else")
            .await
            .unwrap();
        assert!(!response.is_empty());
    }

    #[tokio::test]
    async fn test_groq_error_handling() {
        // Use invalid endpoint to trigger error
        let provider = GroqProvider::new("http://localhost:99999", "llama", "key")
            .unwrap()
            .with_max_retries(1);

        let result = provider.complete(None, "test").await;

        match result {
            Err(LlmError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_without_runtime() {
        let provider = GroqProvider::new("http://localhost:99999", "llama", "key")
            .unwrap()
            .with_max_retries(1);
        assert!(matches!(
            provider.generate("test"),
            Err(LlmError::Communication(_))
        ));
    }
}
