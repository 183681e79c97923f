//! The [`JobStore`] -- durable mapping from job identity to state and results.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use boardcast_core::{Job, JobResult, JobStatus};
use tokio::sync::RwLock;

use crate::persist;

/// Live job state collection file.
const JOBS_FILE: &str = "jobs.json";

/// Completed results collection file.
const RESULTS_FILE: &str = "results.json";

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

struct Inner {
    jobs: BTreeMap<String, Job>,
    results: BTreeMap<String, JobResult>,
}

/// Durable store for jobs and their results.
///
/// Both collections live under one `RwLock` so that [`JobStore::remove`]
/// can delete a job and its result atomically with respect to readers: no
/// reader ever observes the job gone but the result still present, or vice
/// versa. Writes hold the exclusive guard only across the in-memory update
/// and the file flush -- never across an external call.
///
/// Concurrent writes to the same job id are serialized last-writer-wins,
/// which is sufficient because transitions are issued by a single
/// sequential pipeline run per job.
pub struct JobStore {
    data_dir: PathBuf,
    inner: RwLock<Inner>,
}

impl JobStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed
    /// and loading both collections. Missing or damaged files yield empty
    /// collections, never an error.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir).await?;

        let jobs: Vec<Job> = persist::load_collection(&data_dir.join(JOBS_FILE)).await;
        let results: Vec<JobResult> = persist::load_collection(&data_dir.join(RESULTS_FILE)).await;

        tracing::info!(
            path = %data_dir.display(),
            jobs = jobs.len(),
            results = results.len(),
            "Job store opened"
        );

        Ok(Self {
            data_dir,
            inner: RwLock::new(Inner {
                jobs: jobs.into_iter().map(|j| (j.job_id.clone(), j)).collect(),
                results: results
                    .into_iter()
                    .map(|r| (r.job_id.clone(), r))
                    .collect(),
            }),
        })
    }

    /// Directory holding the data files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ---- jobs ----

    /// Upsert a job by identity and return the stored value.
    ///
    /// The write is durable on disk before this returns. The synthetic
    /// `deleted` status is wire-only and is rejected here.
    pub async fn put(&self, job: Job) -> Result<Job, StoreError> {
        debug_assert!(job.status != JobStatus::Deleted, "deleted is never persisted");

        let mut inner = self.inner.write().await;
        inner.jobs.insert(job.job_id.clone(), job.clone());
        self.flush_jobs(&inner).await?;
        Ok(job)
    }

    /// Fetch a job by id.
    pub async fn get(&self, job_id: &str) -> Option<Job> {
        self.inner.read().await.jobs.get(job_id).cloned()
    }

    /// All jobs, in id order.
    pub async fn list(&self) -> Vec<Job> {
        self.inner.read().await.jobs.values().cloned().collect()
    }

    /// All jobs on one channel, in id order.
    pub async fn list_channel(&self, channel_id: &str) -> Vec<Job> {
        self.inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.channel_id == channel_id)
            .cloned()
            .collect()
    }

    /// Remove a job and its result in one atomic step.
    ///
    /// Returns the removed job, or `None` when the id is unknown (a second
    /// delete of the same id is a clean not-found, never a failure).
    pub async fn remove(&self, job_id: &str) -> Result<Option<Job>, StoreError> {
        let mut inner = self.inner.write().await;

        let Some(job) = inner.jobs.remove(job_id) else {
            return Ok(None);
        };
        let had_result = inner.results.remove(job_id).is_some();

        self.flush_jobs(&inner).await?;
        if had_result {
            self.flush_results(&inner).await?;
        }

        Ok(Some(job))
    }

    // ---- results ----

    /// Upsert a result by job identity. Durable before return.
    pub async fn put_result(&self, result: JobResult) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.results.insert(result.job_id.clone(), result);
        self.flush_results(&inner).await
    }

    /// Fetch a result by job id.
    pub async fn get_result(&self, job_id: &str) -> Option<JobResult> {
        self.inner.read().await.results.get(job_id).cloned()
    }

    // ---- private flush helpers ----

    async fn flush_jobs(&self, inner: &Inner) -> Result<(), StoreError> {
        let jobs: Vec<&Job> = inner.jobs.values().collect();
        let bytes = serde_json::to_vec_pretty(&jobs)?;
        persist::write_atomic(&self.data_dir.join(JOBS_FILE), &bytes).await?;
        Ok(())
    }

    async fn flush_results(&self, inner: &Inner) -> Result<(), StoreError> {
        let results: Vec<&JobResult> = inner.results.values().collect();
        let bytes = serde_json::to_vec_pretty(&results)?;
        persist::write_atomic(&self.data_dir.join(RESULTS_FILE), &bytes).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use boardcast_core::JobStatus;

    fn job(id: &str, channel: &str) -> Job {
        Job::new(id, channel)
    }

    fn result(id: &str) -> JobResult {
        JobResult {
            job_id: id.to_string(),
            summary_text: "summary".into(),
            audio_url: format!("/audio/{id}.mp3"),
            duration_secs: 60,
        }
    }

    #[tokio::test]
    async fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();

        store.put(job("job_1", "ws_demo")).await.unwrap();

        let got = store.get("job_1").await.unwrap();
        assert_eq!(got.job_id, "job_1");
        assert_eq!(got.status, JobStatus::Uploaded);
    }

    #[tokio::test]
    async fn get_unknown_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn put_upserts_by_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();

        store.put(job("job_1", "ws_demo")).await.unwrap();
        let mut updated = job("job_1", "ws_demo");
        updated.transition(JobStatus::Analyzing).unwrap();
        store.put(updated).await.unwrap();

        assert_eq!(store.list().await.len(), 1);
        assert_eq!(store.get("job_1").await.unwrap().status, JobStatus::Analyzing);
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = JobStore::open(dir.path()).await.unwrap();
            store.put(job("job_1", "ws_demo")).await.unwrap();
            store.put_result(result("job_1")).await.unwrap();
        }

        let store = JobStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("job_1").await.unwrap().job_id, "job_1");
        assert_eq!(store.get_result("job_1").await.unwrap().duration_secs, 60);
    }

    #[tokio::test]
    async fn opens_empty_when_files_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path().join("fresh")).await.unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn opens_empty_when_file_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(JOBS_FILE), b"not json")
            .await
            .unwrap();

        let store = JobStore::open(dir.path()).await.unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn remove_deletes_job_and_result_together() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();

        store.put(job("job_1", "ws_demo")).await.unwrap();
        store.put_result(result("job_1")).await.unwrap();

        let removed = store.remove("job_1").await.unwrap();
        assert_eq!(removed.unwrap().job_id, "job_1");
        assert!(store.get("job_1").await.is_none());
        assert!(store.get_result("job_1").await.is_none());
    }

    #[tokio::test]
    async fn second_remove_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();

        store.put(job("job_1", "ws_demo")).await.unwrap();
        assert!(store.remove("job_1").await.unwrap().is_some());
        assert!(store.remove("job_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_channel_filters() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();

        store.put(job("job_1", "ws_demo")).await.unwrap();
        store.put(job("job_2", "ws_other")).await.unwrap();
        store.put(job("job_3", "ws_demo")).await.unwrap();

        let jobs = store.list_channel("ws_demo").await;
        let ids: Vec<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["job_1", "job_3"]);
    }

    #[tokio::test]
    async fn result_overwritten_on_retry_success() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();

        store.put_result(result("job_1")).await.unwrap();
        let mut second = result("job_1");
        second.summary_text = "fresh run".into();
        store.put_result(second).await.unwrap();

        assert_eq!(store.get_result("job_1").await.unwrap().summary_text, "fresh run");
    }

    #[tokio::test]
    async fn writes_to_different_jobs_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(JobStore::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put(Job::new(format!("job_{i}"), "ws_demo")).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.list().await.len(), 16);
    }
}
