//! Language Model Client for a local Ollama-compatible `/api/generate` endpoint

use crate::error::{PinnError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_LLM_URL: &str = "http://127.0.0.1:11434/api/generate";
pub const DEFAULT_MODEL: &str = "mistral:latest";

/// Text-in, text-out model seam used by the conversation pipeline.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            model,
        }
    }

    /// One non-streaming generation call against `model`.
    pub async fn generate_with_model(&self, prompt: &str, model: &str) -> Result<String> {
        info!("🤖 Calling model {} at {}", model, self.base_url);
        debug!("Prompt: {}", prompt);

        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PinnError::Request(format!("LLM API call failed: {}", e)))?
            .error_for_status()
            .map_err(|e| PinnError::Request(format!("LLM API returned an error status: {}", e)))?;

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PinnError::Request(format!("Failed to parse LLM response: {}", e)))?;

        debug!("Model replied with {} chars", reply.response.len());
        Ok(reply.response)
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_model(prompt, &self.model).await
    }
}
