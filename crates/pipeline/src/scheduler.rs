//! Run scheduling and the per-job in-flight guard.
//!
//! [`Pipeline::submit`] spawns one independent run per job and returns
//! immediately; runs for different jobs proceed fully in parallel. A
//! second submit or retry for a job whose run is still in flight is
//! rejected -- a given job never has two runs executing simultaneously.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use boardcast_core::{CoreError, Job};
use boardcast_events::{JobEvent, Notifier};
use boardcast_store::{JobStore, StoreError};

use crate::backoff::RetryPolicy;
use crate::provider::{SpeechProvider, VisionProvider};
use crate::runner;

/// Pipeline tuning and artifact placement.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory the synthesized MP3s are written to.
    pub audio_dir: PathBuf,
    /// Voice used when a job carries no selector.
    pub default_voice: String,
    /// Vision retry policy.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("public/audio"),
            default_voice: "ja-JP-Neural2-B".into(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Errors from scheduling operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A run for this job is already executing.
    #[error("a run for job {0} is already in flight")]
    AlreadyRunning(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Dependencies shared by every run.
pub(crate) struct Shared {
    pub store: Arc<JobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub vision: Arc<dyn VisionProvider>,
    pub speech: Arc<dyn SpeechProvider>,
    pub config: PipelineConfig,
}

/// Schedules pipeline runs. Cheap to clone; share via `Arc` or clone.
#[derive(Clone)]
pub struct Pipeline {
    shared: Arc<Shared>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Pipeline {
    pub fn new(
        store: Arc<JobStore>,
        notifier: Arc<dyn Notifier>,
        vision: Arc<dyn VisionProvider>,
        speech: Arc<dyn SpeechProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                notifier,
                vision,
                speech,
                config,
            }),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Schedule a run for `job` and return immediately.
    ///
    /// The caller has already written the job's `uploaded` state; the run
    /// itself begins with the transition into `analyzing`.
    pub fn submit(&self, job: Job) -> Result<(), PipelineError> {
        let guard = self
            .claim(&job.job_id)
            .ok_or_else(|| PipelineError::AlreadyRunning(job.job_id.clone()))?;

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            runner::run(shared, job).await;
            drop(guard);
        });
        Ok(())
    }

    /// Re-arm an errored job: reset to `uploaded`/0 (write + notify) and
    /// schedule a fresh run.
    ///
    /// Rejected when the job is unknown, not in `error`, or a run for it
    /// is still in flight. The prior result, if any, stays until the
    /// fresh run overwrites it.
    pub async fn retry(&self, job_id: &str) -> Result<Job, PipelineError> {
        let guard = self
            .claim(job_id)
            .ok_or_else(|| PipelineError::AlreadyRunning(job_id.to_string()))?;

        let mut job = self
            .shared
            .store
            .get(job_id)
            .await
            .ok_or_else(|| CoreError::NotFound {
                entity: "Job",
                id: job_id.to_string(),
            })?;

        job.reset_for_retry()?;
        let job = self.shared.store.put(job).await?;
        self.shared.notifier.notify(JobEvent::for_job(job.clone())).await;

        let shared = Arc::clone(&self.shared);
        let scheduled = job.clone();
        tokio::spawn(async move {
            runner::run(shared, scheduled).await;
            drop(guard);
        });

        Ok(job)
    }

    /// Whether a run for `job_id` is currently executing.
    pub fn is_in_flight(&self, job_id: &str) -> bool {
        self.lock_in_flight().contains(job_id)
    }

    /// Claim the in-flight marker for `job_id`.
    ///
    /// Returns `None` when a run already holds it. The returned guard
    /// releases the marker on drop, on every run exit path.
    fn claim(&self, job_id: &str) -> Option<InFlightGuard> {
        let mut set = self.lock_in_flight();
        if !set.insert(job_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            set: Arc::clone(&self.in_flight),
            job_id: job_id.to_string(),
        })
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // No code path panics while holding this lock.
        self.in_flight.lock().expect("in-flight set poisoned")
    }
}

/// Releases a job's in-flight marker when dropped.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    job_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.job_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_on_drop() {
        let set = Arc::new(Mutex::new(HashSet::new()));
        set.lock().unwrap().insert("job_1".to_string());

        drop(InFlightGuard {
            set: Arc::clone(&set),
            job_id: "job_1".into(),
        });

        assert!(!set.lock().unwrap().contains("job_1"));
    }
}
