//! Ollama Provider Implementation
//!
//! Generative-text adapter for a local or remote Ollama server.
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama `/api/generate` endpoint
//! - Configurable endpoint, model and request timeout
//! - Blocking wrapper for use behind the synchronous `LlmProvider` trait
//!
//! Requests are sent exactly once. Quota and availability errors are mapped
//! onto distinct [`LlmError`] variants so callers can report them precisely.
//!
//! # Examples
//!
//! ```no_run
//! use intake_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1");
//!
//! // `generate` is async; the `LlmProvider` trait offers a blocking wrapper
//! ```

use crate::LlmError;
use intake_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for generation requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API provider
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Build an HTTP client that keeps no idle connections
///
/// The blocking wrapper runs each request on a short-lived runtime; pooled
/// connections would outlive the runtime that owns their I/O driver.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(0)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Run a future to completion on a fresh single-threaded runtime
///
/// Must be called from a thread that is not already driving a runtime
/// (e.g. inside `tokio::task::spawn_blocking`).
pub(crate) fn block_on<F, T, E>(future: F, on_error: impl FnOnce(String) -> E) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| on_error(format!("Failed to start runtime: {}", e)))?;
    runtime.block_on(future)
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.1", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
            client: build_client(timeout),
        }
    }

    /// Create a new Ollama provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_client(timeout);
        self
    }

    /// Configured request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Generate text using the Ollama API
    ///
    /// # Errors
    ///
    /// - [`LlmError::ModelNotAvailable`] when the server does not know the model
    /// - [`LlmError::RateLimitExceeded`] on HTTP 429
    /// - [`LlmError::Communication`] for transport failures and other statuses
    /// - [`LlmError::InvalidResponse`] when the body cannot be decoded
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!("POST {} (model={}, prompt_chars={})", url, self.model, prompt.len());

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        let body = response
            .json::<OllamaGenerateResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(body.response)
    }
}

impl LlmProviderTrait for OllamaProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        block_on(OllamaProvider::generate(self, prompt), LlmError::Other)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
