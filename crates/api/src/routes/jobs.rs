//! Handlers for the `/jobs` resource.
//!
//! Thin request parsing over the store and pipeline: the state machine,
//! persistence, and notification ordering all live below this layer.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use boardcast_core::{CoreError, Job, JobResult, JobStatus};
use boardcast_events::JobEvent;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /              -> list_jobs
/// GET    /{id}          -> get_job
/// PATCH  /{id}          -> update_job
/// DELETE /{id}          -> delete_job
/// POST   /{id}/retry    -> retry_job
/// GET    /{id}/result   -> get_result
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_jobs))
        .route("/{id}", get(get_job).patch(update_job).delete(delete_job))
        .route("/{id}/retry", post(retry_job))
        .route("/{id}/result", get(get_result))
}

/// GET /api/v1/jobs -- every known job.
async fn list_jobs(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Job>>>> {
    let jobs = state.store.list().await;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{id}
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Job>>> {
    let job = state.store.get(&id).await.ok_or(CoreError::NotFound {
        entity: "Job",
        id: id.clone(),
    })?;
    Ok(Json(DataResponse { data: job }))
}

/// Body of the title update request.
#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
}

/// PATCH /api/v1/jobs/{id} -- update the human title.
///
/// A title change is a state mutation like any other: one store write,
/// one notification.
async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateJobRequest>,
) -> AppResult<Json<DataResponse<Job>>> {
    let title = body
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("title required".into()))?;

    let mut job = state.store.get(&id).await.ok_or(CoreError::NotFound {
        entity: "Job",
        id: id.clone(),
    })?;
    job.title = Some(title);

    let job = state.store.put(job).await?;
    state.notifier.notify(JobEvent::for_job(job.clone())).await;

    Ok(Json(DataResponse { data: job }))
}

/// DELETE /api/v1/jobs/{id} -- remove job and result, then tell viewers.
///
/// The store removes both records atomically; the synthetic `deleted`
/// status is pushed afterwards so connected viewers drop the job. A
/// second delete of the same id reports not-found.
async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let Some(mut job) = state.store.remove(&id).await? else {
        return Err(CoreError::NotFound {
            entity: "Job",
            id: id.clone(),
        }
        .into());
    };

    job.status = JobStatus::Deleted;
    state.notifier.notify(JobEvent::for_job(job)).await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/{id}/retry -- re-arm an errored job.
async fn retry_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Job>>> {
    let job = state.pipeline.retry(&id).await?;
    Ok(Json(DataResponse { data: job }))
}

/// GET /api/v1/jobs/{id}/result -- the completed result, 404 until `done`.
async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<JobResult>>> {
    let result = state
        .store
        .get_result(&id)
        .await
        .ok_or(CoreError::NotFound {
            entity: "JobResult",
            id: id.clone(),
        })?;
    Ok(Json(DataResponse { data: result }))
}
