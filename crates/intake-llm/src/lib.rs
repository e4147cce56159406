//! Intake Service Adapters
//!
//! Implementations of the two remote-service traits from `intake-domain`:
//!
//! - `LlmProvider` (generative text): [`MockProvider`], [`OllamaProvider`]
//! - `DocumentProcessor` (document understanding): [`MockProcessor`],
//!   [`HttpDocumentProcessor`]
//!
//! None of the adapters retry. A failed call is reported once and the caller
//! decides what happens next.
//!
//! # Examples
//!
//! ```
//! use intake_llm::MockProvider;
//! use intake_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("Looks fine.\nDecision: APPROVE");
//! let result = provider.generate("test prompt").unwrap();
//! assert!(result.ends_with("APPROVE"));
//! ```

#![warn(missing_docs)]

pub mod document;
pub mod ollama;

use intake_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use document::{DocumentError, HttpDocumentProcessor, MockProcessor};
pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
///
/// # Examples
///
/// ```
/// use intake_llm::MockProvider;
/// use intake_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// // Responses keyed by a fragment of the prompt
/// let mut provider = MockProvider::default();
/// provider.add_response("invoice", "Invoice summary. Decision: FLAG");
/// assert_eq!(provider.generate("...invoice text...").unwrap(), "Invoice summary. Decision: FLAG");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    failures: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Return `response` whenever the prompt contains `fragment`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(fragment.into(), response.into());
    }

    /// Fail (as a quota error) whenever the prompt contains `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>) {
        self.failures.lock().unwrap().push(fragment.into());
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }

    /// The most recent prompt received
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());

        if self.failures.lock().unwrap().iter().any(|f| prompt.contains(f.as_str())) {
            return Err(LlmError::RateLimitExceeded);
        }

        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, response)| response)
        {
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
