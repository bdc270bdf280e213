use crate::config::Config;
use crate::error::{Result, Text2SqlError};
use crate::llm::model::{Message, ModelConfig};
use crate::llm::provider::LlmProvider;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// client for any openai-compatible `/chat/completions` endpoint
pub struct ChatCompletionsClient {
    http: Client,
    api_base: String,
    api_key: Option<String>,
    config: ModelConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>, config: ModelConfig) -> Self {
        tracing::info!("chat completions provider using model {}", config.model_name);

        Self {
            http: Client::new(),
            api_base: api_base.into(),
            api_key,
            config,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_base.clone(),
            config.api_key.clone(),
            ModelConfig {
                model_name: config.model_name.clone(),
                ..ModelConfig::default()
            },
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsClient {
    fn model_name(&self) -> &str {
        &self.config.model_name
    }

    #[tracing::instrument(skip(self, messages), fields(llm.model = %self.config.model_name, message_count = messages.len()))]
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model_name,
            messages: &messages,
            temperature: self.config.temperature,
        };

        let mut request = self.http.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Text2SqlError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let detail = response.text().await.unwrap_or_default();
            return Err(Text2SqlError::RateLimited(format!("{}: {}", status, detail)));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Text2SqlError::Transport(format!("{}: {}", status, detail)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Text2SqlError::Transport(format!("invalid response body: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Text2SqlError::Transport("response contained no choices".to_string()))?;

        tracing::debug!("generated {} chars", content.len());
        Ok(content)
    }
}
