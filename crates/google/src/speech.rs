//! REST client for the Cloud Text-to-Speech `text:synthesize` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use boardcast_pipeline::{ProviderError, SpeechProvider};
use serde::Deserialize;

/// Public Cloud Text-to-Speech host.
const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback when a voice name carries no parseable language prefix.
const DEFAULT_LANGUAGE: &str = "ja-JP";

/// HTTP client for Cloud Text-to-Speech.
pub struct CloudTts {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CloudTts {
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

/// Language code embedded in a standard voice name
/// (`ja-JP-Neural2-B` → `ja-JP`).
fn language_of(voice: &str) -> String {
    let mut segments = voice.split('-');
    match (segments.next(), segments.next()) {
        (Some(lang), Some(region)) if !lang.is_empty() && !region.is_empty() => {
            format!("{lang}-{region}")
        }
        _ => DEFAULT_LANGUAGE.to_string(),
    }
}

/// Request body for `text:synthesize`, fixed to MP3 output.
fn request_body(text: &str, voice: &str) -> serde_json::Value {
    serde_json::json!({
        "input": { "text": text },
        "voice": { "languageCode": language_of(voice), "name": voice },
        "audioConfig": { "audioEncoding": "MP3" },
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

#[async_trait]
impl SpeechProvider for CloudTts {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/v1/text:synthesize", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(text, voice))
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

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| ProviderError::Request(format!("invalid audio encoding: {e}")))?;

        if audio.is_empty() {
            return Err(ProviderError::EmptyPayload);
        }
        Ok(audio)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_extracted_from_voice_name() {
        assert_eq!(language_of("ja-JP-Neural2-B"), "ja-JP");
        assert_eq!(language_of("en-US-Wavenet-D"), "en-US");
    }

    #[test]
    fn malformed_voice_name_falls_back() {
        assert_eq!(language_of("neural2"), "ja-JP");
        assert_eq!(language_of(""), "ja-JP");
    }

    #[test]
    fn request_body_pins_mp3_encoding() {
        let body = request_body("こんにちは", "ja-JP-Neural2-B");

        assert_eq!(body["input"]["text"], "こんにちは");
        assert_eq!(body["voice"]["languageCode"], "ja-JP");
        assert_eq!(body["voice"]["name"], "ja-JP-Neural2-B");
        assert_eq!(body["audioConfig"]["audioEncoding"], "MP3");
    }

    #[test]
    fn response_audio_is_base64_decoded() {
        let parsed: SynthesizeResponse =
            serde_json::from_value(serde_json::json!({ "audioContent": "aGVsbG8=" })).unwrap();
        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .unwrap();
        assert_eq!(audio, b"hello");
    }
}
