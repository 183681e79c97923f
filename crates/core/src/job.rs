//! Job records and the pipeline status state machine.
//!
//! A [`Job`] tracks one uploaded whiteboard photo through the narration
//! pipeline. Status moves along a fixed path -- `uploaded → analyzing →
//! narrating → done`, with `error` reachable from any non-terminal state --
//! and each status carries a fixed progress value. [`JobStatus::Deleted`]
//! is a synthetic wire-only status: it is pushed to viewers when a job is
//! removed and is never written to the store.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Pipeline status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Photo received, run not yet started (or reset by a retry).
    Uploaded,
    /// Vision analysis in progress.
    Analyzing,
    /// Speech synthesis in progress.
    Narrating,
    /// Terminal: narration audio is available.
    Done,
    /// Terminal: the run failed; the job can be retried.
    Error,
    /// Synthetic terminal status pushed when a job is deleted.
    /// Never persisted -- viewers use it to drop the job client-side.
    Deleted,
}

impl JobStatus {
    /// The fixed progress value a job carries in this status.
    pub fn progress(self) -> u8 {
        match self {
            JobStatus::Uploaded => 0,
            JobStatus::Analyzing => 10,
            JobStatus::Narrating => 50,
            JobStatus::Done => 100,
            JobStatus::Error => 0,
            JobStatus::Deleted => 0,
        }
    }

    /// Whether a run for a job in this status has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Deleted)
    }

    /// Whether `next` is a legal successor of `self` within a run.
    ///
    /// `Error` is reachable from every non-terminal state; the success path
    /// never skips a step. `Deleted` is not part of the run state machine.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Uploaded, JobStatus::Analyzing)
                | (JobStatus::Analyzing, JobStatus::Narrating)
                | (JobStatus::Narrating, JobStatus::Done)
                | (JobStatus::Uploaded, JobStatus::Error)
                | (JobStatus::Analyzing, JobStatus::Error)
                | (JobStatus::Narrating, JobStatus::Error)
                | (JobStatus::Error, JobStatus::Uploaded)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::Analyzing => "analyzing",
            JobStatus::Narrating => "narrating",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
            JobStatus::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One user-submitted unit of work, tracked by identity and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque caller-assigned identity, unique across the store.
    pub job_id: String,
    /// The workshop channel whose viewers see this job.
    pub channel_id: String,
    pub status: JobStatus,
    /// 0–100, fixed per status. Monotonically non-decreasing within a run;
    /// reset to 0 by a retry.
    pub progress: u8,
    /// Human title, defaulted from the upload filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Voice-profile selector for speech synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Path of the uploaded image, kept so a retry can re-run the pipeline
    /// without scanning the uploads directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_ref: Option<String>,
}

impl Job {
    /// Create a freshly uploaded job (status `uploaded`, progress 0).
    pub fn new(job_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            channel_id: channel_id.into(),
            status: JobStatus::Uploaded,
            progress: 0,
            title: None,
            voice: None,
            input_ref: None,
        }
    }

    /// Attach a title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach a voice selector.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Attach the uploaded image path.
    pub fn with_input_ref(mut self, input_ref: impl Into<String>) -> Self {
        self.input_ref = Some(input_ref.into());
        self
    }

    /// Move the job to `status`, setting the status's fixed progress.
    ///
    /// Rejects transitions outside the run state machine so a bug in a
    /// caller cannot produce an unreachable sequence.
    pub fn transition(&mut self, status: JobStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(status) {
            return Err(CoreError::Conflict(format!(
                "illegal status transition {} -> {} for job {}",
                self.status, status, self.job_id
            )));
        }
        self.status = status;
        self.progress = status.progress();
        Ok(())
    }

    /// Reset an errored job for a fresh run (`uploaded`, progress 0).
    pub fn reset_for_retry(&mut self) -> Result<(), CoreError> {
        if self.status != JobStatus::Error {
            return Err(CoreError::Conflict(format!(
                "job {} is {}, only error jobs can be retried",
                self.job_id, self.status
            )));
        }
        self.status = JobStatus::Uploaded;
        self.progress = 0;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JobResult
// ---------------------------------------------------------------------------

/// The durable output of a successfully completed job.
///
/// Created exactly once per successful run (overwritten on retry-success),
/// removed together with its job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// Matches the id of an existing or former [`Job`].
    pub job_id: String,
    /// The full vision-model response (summary plus narration script).
    pub summary_text: String,
    /// Gateway-relative URL of the synthesized audio artifact.
    pub audio_url: String,
    /// Approximate narration duration in seconds.
    pub duration_secs: u32,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_fixed_per_status() {
        assert_eq!(JobStatus::Uploaded.progress(), 0);
        assert_eq!(JobStatus::Analyzing.progress(), 10);
        assert_eq!(JobStatus::Narrating.progress(), 50);
        assert_eq!(JobStatus::Done.progress(), 100);
        assert_eq!(JobStatus::Error.progress(), 0);
    }

    #[test]
    fn success_path_transitions() {
        let mut job = Job::new("job_1", "ws_demo");
        job.transition(JobStatus::Analyzing).unwrap();
        assert_eq!(job.progress, 10);
        job.transition(JobStatus::Narrating).unwrap();
        assert_eq!(job.progress, 50);
        job.transition(JobStatus::Done).unwrap();
        assert_eq!(job.progress, 100);
        assert!(job.status.is_terminal());
    }

    #[test]
    fn error_reachable_from_every_running_state() {
        for via in [JobStatus::Uploaded, JobStatus::Analyzing, JobStatus::Narrating] {
            assert!(via.can_transition_to(JobStatus::Error), "{via} -> error");
        }
    }

    #[test]
    fn no_skipping_states() {
        assert!(!JobStatus::Uploaded.can_transition_to(JobStatus::Narrating));
        assert!(!JobStatus::Uploaded.can_transition_to(JobStatus::Done));
        assert!(!JobStatus::Analyzing.can_transition_to(JobStatus::Done));
    }

    #[test]
    fn terminal_states_have_no_successor() {
        for next in [
            JobStatus::Uploaded,
            JobStatus::Analyzing,
            JobStatus::Narrating,
            JobStatus::Done,
            JobStatus::Error,
        ] {
            assert!(!JobStatus::Done.can_transition_to(next));
        }
        // Except the retry re-arm out of `error`.
        assert!(JobStatus::Error.can_transition_to(JobStatus::Uploaded));
        assert!(!JobStatus::Error.can_transition_to(JobStatus::Analyzing));
    }

    #[test]
    fn illegal_transition_is_rejected_and_leaves_job_unchanged() {
        let mut job = Job::new("job_1", "ws_demo");
        let err = job.transition(JobStatus::Done).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(job.status, JobStatus::Uploaded);
        assert_eq!(job.progress, 0);
    }

    #[test]
    fn retry_resets_error_job() {
        let mut job = Job::new("job_2", "ws_demo");
        job.transition(JobStatus::Analyzing).unwrap();
        job.transition(JobStatus::Error).unwrap();
        job.reset_for_retry().unwrap();
        assert_eq!(job.status, JobStatus::Uploaded);
        assert_eq!(job.progress, 0);
    }

    #[test]
    fn retry_on_non_error_job_is_rejected() {
        let mut job = Job::new("job_1", "ws_demo");
        assert!(job.reset_for_retry().is_err());
        job.transition(JobStatus::Analyzing).unwrap();
        job.transition(JobStatus::Narrating).unwrap();
        job.transition(JobStatus::Done).unwrap();
        assert!(job.reset_for_retry().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Analyzing).unwrap(),
            "\"analyzing\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Deleted).unwrap(),
            "\"deleted\""
        );
    }

    #[test]
    fn job_roundtrips_through_json() {
        let job = Job::new("job_1", "ws_demo")
            .with_title("board-1")
            .with_voice("ja-JP-Neural2-B")
            .with_input_ref("public/uploads/job_1_board.jpg");
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let json = serde_json::to_value(Job::new("job_1", "ws_demo")).unwrap();
        assert!(json.get("title").is_none());
        assert!(json.get("voice").is_none());
        assert!(json.get("input_ref").is_none());
    }
}
