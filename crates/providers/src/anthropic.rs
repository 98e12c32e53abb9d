use crate::{LlmProvider, ProviderError};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    cfg: Arc<AnthropicConfig>,
}

impl AnthropicProvider {
    pub fn new(cfg: AnthropicConfig) -> Self {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            cfg: Arc::new(cfg),
        }
    }
}

#[derive(Deserialize)]
struct MessagesApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        #[derive(serde::Serialize)]
        struct ChatMessage<'a> {
            role: &'static str,
            content: &'a str,
        }
        #[derive(serde::Serialize)]
        struct MessagesRequest<'a> {
            model: &'a str,
            max_tokens: u32,
            system: &'a str,
            messages: Vec<ChatMessage<'a>>,
        }

        let body = MessagesRequest {
            model: &self.cfg.model,
            max_tokens: self.cfg.max_tokens,
            system,
            messages: vec![ChatMessage {
                role: "user",
                content: user,
            }],
        };

        tracing::debug!(model = %self.cfg.model, "consulting oracle");
        let resp = self
            .client
            .post(format!("{}/v1/messages", self.cfg.base_url))
            .header("x-api-key", &self.cfg.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "status {}: {}",
                status, detail
            )));
        }

        let parsed: MessagesApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| ProviderError::RequestFailed("empty reply content".into()))
    }
}
