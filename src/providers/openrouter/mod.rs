use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::errors::NonnoError;
use crate::providers::base::{CompletionProvider, CompletionRequest};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// OpenAI-compatible chat-completions client (OpenRouter wire format).
pub struct OpenRouterProvider {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: Client,
}

impl OpenRouterProvider {
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            client: Client::builder()
                .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn user_content(request: &CompletionRequest) -> Value {
        match &request.image {
            Some(image) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
                json!([
                    {
                        "type": "text",
                        "text": request.user_text
                    },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{};base64,{}", image.mime, encoded)
                        }
                    }
                ])
            }
            None => json!(request.user_text),
        }
    }

    fn parse_content(body: &Value) -> Result<String> {
        let content = body["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(str::trim)
            .unwrap_or("");
        if content.is_empty() {
            return Err(NonnoError::EmptyCompletion.into());
        }
        Ok(content.to_string())
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(NonnoError::MissingCredential("OPENROUTER_API_KEY"))?;

        let payload = json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "messages": [
                {
                    "role": "system",
                    "content": request.system
                },
                {
                    "role": "user",
                    "content": Self::user_content(&request)
                }
            ],
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .context("Failed to reach the completion API")?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NonnoError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body: Value = response
            .json()
            .await
            .context("Completion API returned a non-JSON body")?;
        Self::parse_content(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
