//! Inference endpoint client.
//!
//! The pipeline only sees [`InferenceClient`]: a prompt plus an optional
//! system instruction in, generated text out. [`OllamaClient`] implements it
//! against a local Ollama server's `/api/generate` endpoint with streaming
//! disabled.

use std::future::Future;
use std::time::Instant;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use reqminer_shared::{InferenceConfig, ReqMinerError, Result};

/// User-Agent string for inference requests.
const USER_AGENT: &str = concat!("reqminer/", env!("CARGO_PKG_VERSION"));

/// Longest response excerpt quoted back in error messages.
const ERROR_EXCERPT_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A synchronous-contract text generator: one request, one full response.
pub trait InferenceClient: Send + Sync {
    /// Generate a completion for `prompt`, steered by an optional `system` instruction.
    fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

// ---------------------------------------------------------------------------
// OllamaClient
// ---------------------------------------------------------------------------

/// HTTP client for Ollama's non-streaming generate API.
pub struct OllamaClient {
    config: InferenceConfig,
    client: Client,
    endpoint: String,
}

impl OllamaClient {
    /// Build a client with the configured timeout applied to every request.
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReqMinerError::Inference(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/api/generate",
            config.base_url.as_str().trim_end_matches('/')
        );

        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    /// Model name sent with every request.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Full URL of the generate endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl InferenceClient for OllamaClient {
    #[instrument(skip_all, fields(model = %self.config.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: self.config.num_predict,
            },
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReqMinerError::Inference(format!(
                        "request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    ReqMinerError::Inference(format!("request to {} failed: {e}", self.endpoint))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReqMinerError::Inference(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(ReqMinerError::Inference(format!(
                "HTTP {status}: {}",
                excerpt(&body)
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            ReqMinerError::Inference(format!(
                "invalid response body: {e} (got: {})",
                excerpt(&body)
            ))
        })?;

        debug!(
            latency_ms = started.elapsed().as_millis() as u64,
            response_chars = parsed.response.len(),
            "generation complete"
        );

        Ok(parsed.response)
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(ERROR_EXCERPT_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
