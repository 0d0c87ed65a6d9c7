//! HTTP completion provider.
//!
//! Talks to an OpenAI-compatible chat completions endpoint. The request
//! carries a fixed system prompt that constrains the model to rephrasing:
//! the deterministic reply's meaning, and any question it asks, must
//! survive. Transient failures are retried with a short backoff; anything
//! left over surfaces as a [`CompletionError`] for the caller's fallback.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::intake::HistoryRole;
use crate::ports::{CompletionError, CompletionProvider, PhrasingRequest};

const SYSTEM_PROMPT: &str = "You are the friendly voice of a counseling practice's intake \
     assistant. Rephrase the assistant reply you are given so it sounds warm and natural \
     for the phone. Keep the same meaning, keep any question it asks, and do not add new \
     questions, offers, or medical content. Reply with the rephrased text only.";

/// Configuration for the HTTP provider.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl HttpProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            temperature: 0.7,
            max_tokens: 200,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// OpenAI-compatible completion provider.
pub struct HttpCompletionProvider {
    config: HttpProviderConfig,
    client: Client,
}

impl HttpCompletionProvider {
    pub fn new(config: HttpProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_wire_request(&self, request: &PhrasingRequest) -> WireRequest {
        let mut system = SYSTEM_PROMPT.to_string();
        if let Some(ref style) = request.tenant_style {
            system.push_str("\nPractice notes: ");
            system.push_str(style);
        }

        let mut messages = vec![WireMessage {
            role: "system".to_string(),
            content: system,
        }];
        for entry in &request.history {
            messages.push(WireMessage {
                role: match entry.role {
                    HistoryRole::User => "user".to_string(),
                    HistoryRole::Assistant => "assistant".to_string(),
                },
                content: entry.content.clone(),
            });
        }
        messages.push(WireMessage {
            role: "user".to_string(),
            content: format!("Rephrase this reply: {}", request.base_reply),
        });

        WireRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    async fn send_request(&self, request: &PhrasingRequest) -> Result<Response, CompletionError> {
        let wire = self.to_wire_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&wire)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    CompletionError::Network(format!("connection failed: {}", e))
                } else {
                    CompletionError::Network(e.to_string())
                }
            })
    }

    async fn handle_status(&self, response: Response) -> Result<Response, CompletionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 => Err(CompletionError::AuthenticationFailed),
            429 => Err(CompletionError::RateLimited {
                retry_after_secs: 30,
            }),
            500..=599 => Err(CompletionError::Unavailable {
                message: format!("server error {}: {}", status, body),
            }),
            _ => Err(CompletionError::Network(format!(
                "unexpected status {}: {}",
                status, body
            ))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<String, CompletionError> {
        let response = self.handle_status(response).await?;

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Parse(format!("failed to parse response: {}", e)))?;

        let content = wire
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CompletionError::Parse("no choices in response".to_string()))?;

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(CompletionError::Parse("empty completion".to_string()));
        }
        Ok(trimmed.to_string())
    }

}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn rephrase(&self, request: PhrasingRequest) -> Result<String, CompletionError> {
        let mut attempt = 0;
        loop {
            let result = match self.send_request(&request).await {
                Ok(response) => self.parse_response(response).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(content) => return Ok(content),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        session_id = %request.session_id,
                        attempt,
                        error = %err,
                        "completion request failed, retrying"
                    );
                    sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionId, TenantId};
    use crate::domain::intake::{HistoryEntry, Stage};

    fn provider() -> HttpCompletionProvider {
        HttpCompletionProvider::new(HttpProviderConfig::new("test-key"))
    }

    #[test]
    fn wire_request_puts_base_reply_last() {
        let request = PhrasingRequest::new(
            "What brings you to call today?",
            Stage::Greeting,
            SessionId::new(),
            TenantId::new("t1").unwrap(),
        )
        .with_history(vec![HistoryEntry::user("hi")]);

        let wire = provider().to_wire_request(&request);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[1].role, "user");
        assert_eq!(wire.messages[1].content, "hi");
        let last = wire.messages.last().unwrap();
        assert!(last.content.contains("What brings you to call today?"));
    }

    #[test]
    fn tenant_style_lands_in_the_system_prompt() {
        let request = PhrasingRequest::new(
            "x",
            Stage::Greeting,
            SessionId::new(),
            TenantId::new("t1").unwrap(),
        )
        .with_tenant_style("Willow Creek Counseling, warm midwestern tone");

        let wire = provider().to_wire_request(&request);
        assert!(wire.messages[0].content.contains("Willow Creek Counseling"));
    }

}
