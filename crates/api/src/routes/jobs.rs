use axum::{
    extract::{Path, State},
    Json,
};
use jobs::JobStatus;
use serde::Serialize;
use solver_heur::Planner;
use types::BatchRequest;
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[utoipa::path(
        post,
        path = "/v1/jobs",
        request_body = BatchRequest,
        responses(
            (status = 200, description = "Job enqueued", body = JobCreated),
            (status = 400, description = "Request rejected before enqueue")
        )
    )]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<JobCreated>, ApiError> {
    let snapshot = state.snapshot();
    Planner::new(&snapshot, state.planner.config()).validate(&req)?;
    let id = state.jobs.enqueue(snapshot, req);
    Ok(Json(JobCreated {
        job_id: id.0,
        status: "queued",
    }))
}

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Job status", body = JobStatus),
            (status = 404, description = "No such job")
        )
    )]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    state
        .jobs
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no job {id}")))
}
