use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::TextModel;
use crate::error::ModelError;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

const MAX_TOKENS: u32 = 2048;

/// Client for any OpenAI-compatible chat completions endpoint.
pub struct LlmClient {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextModel for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        debug!("Sending {} character prompt to {}", prompt.len(), self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": "You are an expert cloud solutions architect. You answer with a single JSON object and nothing else."
                    },
                    {
                        "role": "user",
                        "content": prompt
                    }
                ],
                "temperature": 0.1,
                "max_tokens": MAX_TOKENS,
                "stream": false
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response_json: serde_json::Value = response.json().await?;

        let answer = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ModelError::MalformedResponse {
                reason: "missing choices[0].message.content".to_string(),
            })?
            .trim()
            .to_string();

        if answer.is_empty() {
            return Err(ModelError::EmptyReply);
        }

        Ok(answer)
    }
}
