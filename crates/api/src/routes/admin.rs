use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reloaded {
    pub people: usize,
    pub timetable_entries: usize,
    pub slots: usize,
    pub rooms: usize,
}

#[utoipa::path(
        post,
        path = "/v1/admin/reload",
        responses(
            (status = 200, description = "New snapshot published", body = Reloaded),
            (status = 500, description = "Dataset failed to load; previous snapshot kept")
        )
    )]
pub async fn reload(State(state): State<AppState>) -> Result<Json<Reloaded>, ApiError> {
    let snap = state.reload().await?;
    Ok(Json(Reloaded {
        people: snap.people_count(),
        timetable_entries: snap.entries().len(),
        slots: snap.universe().len(),
        rooms: snap.rooms().pool().len(),
    }))
}
