use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use types::{RoomId, Slot, SlotFilter};
use utoipa::{IntoParams, ToSchema};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotsParams {
    /// Comma-separated day names; empty means every day.
    pub days: Option<String>,
    /// `HH:MM-HH:MM` window the slot must lie inside.
    pub between: Option<String>,
    pub include_excluded: Option<bool>,
}

impl From<SlotsParams> for SlotFilter {
    fn from(p: SlotsParams) -> Self {
        SlotFilter {
            days: p
                .days
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect(),
            between: p.between.filter(|b| !b.trim().is_empty()),
            include_excluded: p.include_excluded.unwrap_or(false),
        }
    }
}

#[utoipa::path(
        get,
        path = "/v1/slots",
        params(SlotsParams),
        responses(
            (status = 200, description = "Slots matching the filter, in day/time order", body = [Slot]),
            (status = 400, description = "Unknown day or malformed window")
        )
    )]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<SlotsParams>,
) -> Result<Json<Vec<Slot>>, ApiError> {
    let snapshot = state.snapshot();
    let query = snapshot.slot_query(&SlotFilter::from(params))?;
    Ok(Json(snapshot.list_slots(&query)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FreeRoomsParams {
    pub day: String,
    pub time: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FreeRooms {
    pub slot: Slot,
    pub free_rooms: Vec<RoomId>,
}

#[utoipa::path(
        get,
        path = "/v1/rooms/free",
        params(FreeRoomsParams),
        responses(
            (status = 200, description = "Rooms in the pool with no class at the slot", body = FreeRooms),
            (status = 400, description = "Unknown slot")
        )
    )]
pub async fn free_rooms(
    State(state): State<AppState>,
    Query(params): Query<FreeRoomsParams>,
) -> Result<Json<FreeRooms>, ApiError> {
    let snapshot = state.snapshot();
    let slot = snapshot.slot(&params.day, &params.time)?;
    Ok(Json(FreeRooms {
        slot,
        free_rooms: snapshot.free_rooms_at(&slot).iter().cloned().collect(),
    }))
}
