//! REST client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use boardcast_pipeline::{ProviderError, VisionProvider};
use serde::Deserialize;

/// Public Generative Language API host.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Vision calls can take tens of seconds on large photos.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for Gemini image analysis.
pub struct GeminiVision {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiVision {
    /// Create a client against the public API host.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom host (test doubles, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

/// Request body for `generateContent`: the prompt plus the photo inline.
fn request_body(mime_type: &str, image: &[u8], prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "parts": [
                { "text": prompt },
                {
                    "inline_data": {
                        "mime_type": mime_type,
                        "data": base64::engine::general_purpose::STANDARD.encode(image),
                    }
                }
            ]
        }]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl VisionProvider for GeminiVision {
    async fn describe_image(
        &self,
        model: &str,
        mime_type: &str,
        image: &[u8],
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(mime_type, image, prompt))
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        parsed.text().ok_or(ProviderError::EmptyPayload)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
