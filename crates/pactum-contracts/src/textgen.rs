// SPDX-FileCopyrightText: 2026 Pactum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP text generator for OpenAI-compatible chat completion APIs.
//!
//! Provides [`HttpTextGenerator`], used for contract summaries and reviews.
//! Requests are never retried; any failure surfaces as an upstream error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use pactum_config::model::AiConfig;
use pactum_core::PactumError;
use pactum_core::traits::{PromptMessage, TextGenerator};

const SERVICE: &str = "ai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for `POST {base_url}/chat/completions` with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpTextGenerator {
    client: reqwest::Client,
    model: String,
    endpoint: String,
}

impl HttpTextGenerator {
    /// Builds a client from the `[ai]` config section. Requires `api_key`.
    pub fn new(config: &AiConfig) -> Result<Self, PactumError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PactumError::Config("ai.api_key is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                PactumError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PactumError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        max_tokens: u32,
    ) -> Result<String, PactumError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| PactumError::upstream(SERVICE, format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "completion response received");
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => api_err.error.message,
                Err(_) => body,
            };
            return Err(PactumError::Upstream {
                service: SERVICE.to_string(),
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            PactumError::upstream(SERVICE, format!("failed to parse completion: {e}"))
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| PactumError::upstream(SERVICE, "completion had no content"))
    }
}
