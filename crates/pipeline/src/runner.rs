//! Execution of a single pipeline run.
//!
//! [`run`] is the boundary the scheduler spawns: it drives [`execute`]
//! and converts any failure -- including a panic -- into an `error`
//! transition, so a job is never left in a non-terminal state once a run
//! returns. The triggering error goes to the operational log only; the
//! store records just the resulting status.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use boardcast_core::{naming, CoreError, Job, JobResult, JobStatus};
use boardcast_events::JobEvent;
use boardcast_store::{persist, StoreError};
use futures::FutureExt;

use crate::provider::{image_mime, ProviderError};
use crate::scheduler::Shared;
use crate::script;

/// Fatal conditions within a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The job record carries no input reference to re-run from.
    #[error("job has no input reference")]
    MissingInput,

    /// The input artifact is missing or unreadable.
    #[error("input artifact unreadable: {0}")]
    Input(#[source] std::io::Error),

    /// Every vision attempt failed.
    #[error("vision analysis failed after {attempts} attempts: {last}")]
    Vision {
        attempts: u32,
        #[source]
        last: ProviderError,
    },

    /// Speech synthesis failed or produced no audio. Not retried.
    #[error("speech synthesis failed: {0}")]
    Speech(#[source] ProviderError),

    /// The audio artifact could not be written.
    #[error("audio artifact write failed: {0}")]
    AudioWrite(#[source] std::io::Error),

    /// A store write failed mid-transition; fatal for the run.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Drive one run for `job` to a terminal state.
pub(crate) async fn run(shared: Arc<Shared>, mut job: Job) {
    let job_id = job.job_id.clone();

    match AssertUnwindSafe(execute(&shared, &mut job)).catch_unwind().await {
        Ok(Ok(())) => {
            tracing::info!(job_id = %job_id, "Pipeline run completed");
        }
        Ok(Err(e)) => {
            tracing::error!(job_id = %job_id, error = %e, "Pipeline run failed");
            fail(&shared, &job_id).await;
        }
        Err(_) => {
            tracing::error!(job_id = %job_id, "Pipeline run panicked");
            fail(&shared, &job_id).await;
        }
    }
}

/// The run sequence: analyze, narrate, persist, finalize.
async fn execute(shared: &Shared, job: &mut Job) -> Result<(), RunError> {
    transition(shared, job, JobStatus::Analyzing).await?;

    let input_ref = job.input_ref.clone().ok_or(RunError::MissingInput)?;
    let image = tokio::fs::read(&input_ref).await.map_err(RunError::Input)?;
    let mime = image_mime(&image);

    let analysis = analyze_with_retry(shared, &job.job_id, mime, &image).await?;
    let script_text = script::extract_script(&analysis).to_string();

    transition(shared, job, JobStatus::Narrating).await?;

    let voice = job
        .voice
        .clone()
        .unwrap_or_else(|| shared.config.default_voice.clone());
    let audio = shared
        .speech
        .synthesize(&script_text, &voice)
        .await
        .map_err(RunError::Speech)?;
    if audio.is_empty() {
        return Err(RunError::Speech(ProviderError::EmptyPayload));
    }

    tokio::fs::create_dir_all(&shared.config.audio_dir)
        .await
        .map_err(RunError::AudioWrite)?;
    let audio_path = shared.config.audio_dir.join(naming::audio_filename(&job.job_id));
    persist::write_atomic(&audio_path, &audio)
        .await
        .map_err(RunError::AudioWrite)?;

    shared
        .store
        .put_result(JobResult {
            job_id: job.job_id.clone(),
            summary_text: analysis,
            audio_url: naming::audio_url(&job.job_id),
            duration_secs: script::estimate_duration_secs(&script_text),
        })
        .await?;

    transition(shared, job, JobStatus::Done).await?;
    Ok(())
}

/// One status transition: store write, then notification, in that order.
async fn transition(shared: &Shared, job: &mut Job, status: JobStatus) -> Result<(), RunError> {
    job.transition(status)?;
    let stored = shared.store.put(job.clone()).await?;
    shared.notifier.notify(JobEvent::for_job(stored)).await;
    Ok(())
}

/// Call the vision provider under the retry policy.
///
/// Each failed attempt is logged with its cause and the backoff that
/// precedes the next attempt. Other jobs' runs are unaffected by the
/// sleeps here.
async fn analyze_with_retry(
    shared: &Shared,
    job_id: &str,
    mime: &str,
    image: &[u8],
) -> Result<String, RunError> {
    let policy = &shared.config.retry;
    let attempts = policy.attempts.max(1);
    let mut last: Option<ProviderError> = None;

    for attempt in 1..=attempts {
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let model = policy.model_for(attempt);
        match shared
            .vision
            .describe_image(model, mime, image, script::NARRATION_PROMPT)
            .await
        {
            Ok(text) => {
                tracing::debug!(job_id = %job_id, attempt, model, "Vision analysis succeeded");
                return Ok(text);
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job_id,
                    attempt,
                    model,
                    backoff_ms = policy.delay_before(attempt + 1).as_millis() as u64,
                    error = %e,
                    "Vision analysis attempt failed"
                );
                last = Some(e);
            }
        }
    }

    Err(RunError::Vision {
        attempts,
        last: last.unwrap_or(ProviderError::EmptyPayload),
    })
}

/// Force the job into the terminal `error` state.
///
/// Reloads the job from the store -- the local copy may be stale when the
/// failure was a store write -- and skips jobs that were deleted mid-run
/// or already reached a terminal state.
async fn fail(shared: &Shared, job_id: &str) {
    let Some(mut job) = shared.store.get(job_id).await else {
        tracing::warn!(job_id = %job_id, "Job vanished before error transition");
        return;
    };
    if job.status.is_terminal() {
        return;
    }

    job.status = JobStatus::Error;
    job.progress = JobStatus::Error.progress();

    match shared.store.put(job.clone()).await {
        Ok(stored) => shared.notifier.notify(JobEvent::for_job(stored)).await,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Failed to persist error transition");
        }
    }
}
