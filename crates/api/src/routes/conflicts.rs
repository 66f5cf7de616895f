use axum::{extract::State, Json};
use types::{ConflictReport, ConflictRequest};

use crate::{error::ApiError, state::AppState};

#[utoipa::path(
        post,
        path = "/v1/conflicts",
        request_body = ConflictRequest,
        responses(
            (status = 200, description = "Busy and free people at the slot", body = ConflictReport),
            (status = 400, description = "Unknown people or slot")
        )
    )]
pub async fn check(
    State(state): State<AppState>,
    Json(req): Json<ConflictRequest>,
) -> Result<Json<ConflictReport>, ApiError> {
    let snapshot = state.snapshot();
    let target = snapshot.resolve_target(&req.target)?;
    let slot = snapshot.slot(&req.day, &req.time)?;
    Ok(Json(snapshot.check_conflict(&target, slot)))
}
