//! The narration pipeline.
//!
//! One pipeline run takes a job from `uploaded` to a terminal state:
//! read the photo, extract content and a narration script via the vision
//! provider (with retry), synthesize speech, persist the audio artifact,
//! write the result, finish. Every state transition is one store write
//! followed by one notification, and a run never returns leaving a job in
//! a non-terminal state.
//!
//! [`Pipeline`] schedules runs -- one concurrent run per job id, enforced
//! by an in-flight guard -- and exposes the `retry` operation.

pub mod backoff;
pub mod provider;
pub mod runner;
pub mod scheduler;
pub mod script;

pub use backoff::RetryPolicy;
pub use provider::{ProviderError, SpeechProvider, VisionProvider};
pub use runner::RunError;
pub use scheduler::{Pipeline, PipelineConfig, PipelineError};
