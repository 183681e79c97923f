//! Provider traits for the external vision and speech capabilities.
//!
//! The pipeline only sees these seams; concrete REST clients live in
//! `boardcast-google`, and tests substitute mocks.

use async_trait::async_trait;

/// Errors from an external capability call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request itself failed (network, DNS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The provider returned a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Api {
        status: u16,
        /// Raw response body for the operational log.
        body: String,
    },

    /// The provider answered without usable content.
    #[error("provider returned an empty payload")]
    EmptyPayload,
}

/// Vision capability: turn a whiteboard photo into analysis text.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Run `prompt` against `image` with the given model variant and
    /// return the full response text.
    async fn describe_image(
        &self,
        model: &str,
        mime_type: &str,
        image: &[u8],
        prompt: &str,
    ) -> Result<String, ProviderError>;
}

/// Speech capability: synthesize narration audio from script text.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize `text` with the given voice and return encoded audio
    /// bytes (MP3).
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Sniff the MIME type of an uploaded image from its header bytes.
///
/// Unrecognized data falls back to JPEG, the dominant upload format.
pub fn image_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::WebP) => "image/webp",
        _ => "image/jpeg",
    }
}
