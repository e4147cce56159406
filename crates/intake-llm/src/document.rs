//! Document-understanding adapters
//!
//! [`HttpDocumentProcessor`] talks to a Document AI style `:process` endpoint:
//! the raw bytes go out base64-encoded alongside their MIME type and the
//! extracted text comes back under `document.text`.

use crate::ollama::{block_on, build_client};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use intake_domain::traits::DocumentProcessor;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default timeout for processing requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Errors that can occur during document processing
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The service refused the document (corrupt, unsupported, too large)
    #[error("Document rejected: {0}")]
    Rejected(String),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument<'a> {
    content: String,
    mime_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest<'a> {
    raw_document: RawDocument<'a>,
}

#[derive(Deserialize)]
struct ProcessResponse {
    document: ProcessedDocument,
}

#[derive(Deserialize)]
struct ProcessedDocument {
    #[serde(default)]
    text: String,
}

/// Remote document processor addressed by project, location and processor id
///
/// Requests are unauthenticated unless a bearer token is set, which suits a
/// local emulator; hosted endpoints need [`with_bearer_token`](Self::with_bearer_token).
pub struct HttpDocumentProcessor {
    url: String,
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpDocumentProcessor {
    /// Create a processor client
    ///
    /// Requests go to
    /// `{endpoint}/v1/projects/{project}/locations/{location}/processors/{processor}:process`.
    pub fn new(endpoint: &str, project_id: &str, location: &str, processor_id: &str) -> Self {
        let url = format!(
            "{}/v1/projects/{}/locations/{}/processors/{}:process",
            endpoint.trim_end_matches('/'),
            project_id,
            location,
            processor_id
        );
        Self {
            url,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            token: None,
        }
    }

    /// Authenticate every request with an OAuth bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Whether requests carry credentials
    pub fn has_credentials(&self) -> bool {
        self.token.is_some()
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Fully-qualified processing URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, body: &ProcessRequest<'_>) -> reqwest::RequestBuilder {
        let request = self.client.post(&self.url).json(body);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Extract text from a document
    pub async fn process(&self, content: &[u8], mime_type: &str) -> Result<String, DocumentError> {
        let body = ProcessRequest {
            raw_document: RawDocument {
                content: STANDARD.encode(content),
                mime_type,
            },
        };

        debug!("POST {} ({} bytes, {})", self.url, content.len(), mime_type);

        let response = self
            .request(&body)
            .send()
            .await
            .map_err(|e| DocumentError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("HTTP {}: {}", status, error_text);
            return Err(if status.is_client_error() {
                DocumentError::Rejected(message)
            } else {
                DocumentError::Communication(message)
            });
        }

        let body = response
            .json::<ProcessResponse>()
            .await
            .map_err(|e| DocumentError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(body.document.text)
    }
}

impl DocumentProcessor for HttpDocumentProcessor {
    type Error = DocumentError;

    fn process(&self, content: &[u8], mime_type: &str) -> Result<String, Self::Error> {
        block_on(HttpDocumentProcessor::process(self, content, mime_type), DocumentError::Communication)
    }
}

/// Mock document processor for deterministic testing
///
/// Returns a fixed text for every document and records what it was given.
#[derive(Debug, Clone)]
pub struct MockProcessor {
    text: String,
    failure: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
    last_mime_type: Arc<Mutex<Option<String>>>,
}

impl MockProcessor {
    /// Create a processor that "extracts" `text` from any document
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failure: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
            last_mime_type: Arc::new(Mutex::new(None)),
        }
    }

    /// Reject every subsequent document with `reason`
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    /// Get the number of times process was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// MIME type passed with the most recent document
    pub fn last_mime_type(&self) -> Option<String> {
        self.last_mime_type.lock().unwrap().clone()
    }
}

impl DocumentProcessor for MockProcessor {
    type Error = DocumentError;

    fn process(&self, _content: &[u8], mime_type: &str) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;
        *self.last_mime_type.lock().unwrap() = Some(mime_type.to_string());

        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return Err(DocumentError::Rejected(reason));
        }
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_url() {
        let processor = HttpDocumentProcessor::new(
            "https://us-documentai.googleapis.com/",
            "docai-final",
            "us",
            "abc123",
        );
        assert_eq!(
            processor.url(),
            "https://us-documentai.googleapis.com/v1/projects/docai-final/locations/us/processors/abc123:process"
        );
    }

    #[test]
    fn test_bearer_token_sets_authorization_header() {
        let body = ProcessRequest {
            raw_document: RawDocument {
                content: STANDARD.encode(b"%PDF"),
                mime_type: "application/pdf",
            },
        };

        let anonymous = HttpDocumentProcessor::new("http://localhost:8080", "p", "us", "x");
        assert!(!anonymous.has_credentials());
        let request = anonymous.request(&body).build().unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());

        let authed = HttpDocumentProcessor::new("http://localhost:8080", "p", "us", "x").with_bearer_token("ya29.token");
        assert!(authed.has_credentials());
        let request = authed.request(&body).build().unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer ya29.token"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = ProcessRequest {
            raw_document: RawDocument {
                content: STANDARD.encode(b"%PDF"),
                mime_type: "application/pdf",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"rawDocument": {"content": "JVBERg==", "mimeType": "application/pdf"}})
        );
    }

    #[test]
    fn test_response_without_text_is_empty() {
        let body: ProcessResponse = serde_json::from_str(r#"{"document": {}}"#).unwrap();
        assert_eq!(body.document.text, "");
    }

    #[test]
    fn test_mock_processor_records_calls() {
        let processor = MockProcessor::new("Extracted text");

        let text = processor.process(b"bytes", "image/png").unwrap();
        assert_eq!(text, "Extracted text");
        assert_eq!(processor.call_count(), 1);
        assert_eq!(processor.last_mime_type().as_deref(), Some("image/png"));
    }

    #[test]
    fn test_mock_processor_failure() {
        let processor = MockProcessor::new("unused");
        processor.fail_with("corrupt file");

        let result = processor.process(b"bytes", "application/pdf");
        assert!(matches!(result, Err(DocumentError::Rejected(r)) if r == "corrupt file"));
        assert_eq!(processor.call_count(), 1);
    }

    #[test]
    fn test_blocking_wrapper_reports_communication_error() {
        let processor = HttpDocumentProcessor::new("http://127.0.0.1:9", "p", "us", "x")
            .with_timeout(Duration::from_secs(2));

        let result = DocumentProcessor::process(&processor, b"bytes", "application/pdf");
        assert!(matches!(result, Err(DocumentError::Communication(_))));
    }
}
