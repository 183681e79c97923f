//! Handler for whiteboard photo uploads.
//!
//! Accepts a multipart form, stores the photo, creates the job in
//! `uploaded` state (write + notify), and schedules the pipeline run.
//! Submission returns immediately; progress arrives over the channel's
//! WebSocket.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use boardcast_core::Job;
use boardcast_events::JobEvent;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Routes mounted at `/uploads`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload))
}

/// Typed response for the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub job_id: String,
}

/// POST /api/v1/uploads
///
/// Multipart fields: `file` (the photo), `channel_id`, optional
/// `voice_id`.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<UploadResult>>)> {
    let mut file: Option<(String, axum::body::Bytes)> = None;
    let mut channel_id: Option<String> = None;
    let mut voice_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = sanitize_filename(field.file_name().unwrap_or("board.jpg"));
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((filename, data));
            }
            "channel_id" => {
                channel_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "voice_id" => {
                voice_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let (filename, data) = file.ok_or_else(|| AppError::BadRequest("file required".into()))?;
    let channel_id = channel_id
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("channel_id required".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("file is empty".into()));
    }

    let job_id = format!("job_{}_{}", chrono::Utc::now().timestamp_millis(), channel_id);

    // Store the photo before the job exists, so a scheduled run never
    // races a half-written input.
    tokio::fs::create_dir_all(&state.config.uploads_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create uploads dir: {e}")))?;
    let input_path = state.config.uploads_dir.join(format!("{job_id}_{filename}"));
    tokio::fs::write(&input_path, &data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

    let mut job = Job::new(job_id.clone(), channel_id)
        .with_title(title_from_filename(&filename))
        .with_input_ref(input_path.to_string_lossy());
    if let Some(voice) = voice_id.filter(|v| !v.trim().is_empty()) {
        job = job.with_voice(voice);
    }

    let job = state.store.put(job).await?;
    state.notifier.notify(JobEvent::for_job(job.clone())).await;
    state.pipeline.submit(job)?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UploadResult { job_id },
        }),
    ))
}

/// Strip any client-supplied path components from an upload filename.
fn sanitize_filename(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("board.jpg")
        .to_string()
}

/// Default title: the filename without its extension.
fn title_from_filename(filename: &str) -> String {
    std::path::Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string())
}
