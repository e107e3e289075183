use crate::models::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Anything that can turn a message list into a single completion.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>, params: &LlmParams) -> Result<String>;
}

pub struct OpenAiService {
    client: Client,
    api_key: String,
    api_base: String,
}

impl OpenAiService {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiService {
    async fn complete(&self, messages: Vec<ChatMessage>, params: &LlmParams) -> Result<String> {
        let request = CompletionRequest {
            model: params.model.clone(),
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        log::info!("Requesting completion from {} ({})", self.api_base, params.model);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let completion: CompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("OpenAI API returned no choices"))
    }
}
