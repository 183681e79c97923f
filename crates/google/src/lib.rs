//! Google REST clients for the pipeline's external capabilities.
//!
//! - [`GeminiVision`] -- the Generative Language `generateContent`
//!   endpoint, used for whiteboard analysis.
//! - [`CloudTts`] -- the Cloud Text-to-Speech `text:synthesize` endpoint,
//!   used for narration audio.
//!
//! Both implement the provider traits from `boardcast-pipeline`; the
//! pipeline never sees HTTP details.

pub mod speech;
pub mod vision;

pub use speech::CloudTts;
pub use vision::GeminiVision;
