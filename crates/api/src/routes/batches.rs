use std::collections::BTreeSet;

use axum::{extract::State, Json};
use sched_core::{BatchSearch, Snapshot};
use serde::Serialize;
use solver_heur::Planner;
use types::{
    BatchRequest, MultiPoolOutcome, MultiPoolRequest, Outcome, PersonId, PersonSummary, Solution,
};
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchesResponse {
    pub outcome: Outcome,
    /// Everyone named in `outcome`, once each.
    pub people: Vec<PersonSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MultiPoolResponse {
    pub outcome: MultiPoolOutcome,
    pub people: Vec<PersonSummary>,
}

fn solutions_of(outcome: &Outcome) -> Vec<&Solution> {
    match outcome {
        Outcome::Success { solutions, .. } | Outcome::SuggestedMoreBatches { solutions, .. } => {
            solutions.iter().collect()
        }
        Outcome::Suggested { suggestions } => suggestions
            .more_batches
            .iter()
            .flat_map(|m| m.solutions.iter())
            .chain(suggestions.relaxed_pool.iter().flatten())
            .collect(),
        Outcome::NoSolution => Vec::new(),
    }
}

pub(crate) fn directory<'a>(
    snapshot: &Snapshot,
    solutions: impl IntoIterator<Item = &'a Solution>,
) -> Vec<PersonSummary> {
    let ids: BTreeSet<&PersonId> = solutions
        .into_iter()
        .flat_map(|s| s.batches.iter())
        .flat_map(|b| b.members.iter())
        .collect();
    ids.into_iter().map(|id| snapshot.summary(id)).collect()
}

#[utoipa::path(
        post,
        path = "/v1/batches",
        request_body = BatchRequest,
        responses(
            (status = 200, description = "Ranked batch plans or suggestions", body = BatchesResponse),
            (status = 400, description = "Request rejected before search")
        )
    )]
pub async fn find(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchesResponse>, ApiError> {
    let snapshot = state.snapshot();
    let outcome = state.planner.search(snapshot.clone(), req).await?;
    let people = directory(&snapshot, solutions_of(&outcome));
    Ok(Json(BatchesResponse { outcome, people }))
}

#[utoipa::path(
        post,
        path = "/v1/batches/multi",
        request_body = MultiPoolRequest,
        responses(
            (status = 200, description = "Per-batch plans, or the single-pool fallback", body = MultiPoolResponse),
            (status = 400, description = "Request rejected before search")
        )
    )]
pub async fn find_multi(
    State(state): State<AppState>,
    Json(req): Json<MultiPoolRequest>,
) -> Result<Json<MultiPoolResponse>, ApiError> {
    let snapshot = state.snapshot();
    let config = state.planner.config().clone();
    let for_task = snapshot.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        Planner::new(&for_task, &config).find_batches_multi_pool(&req)
    })
    .await
    .map_err(anyhow::Error::from)??;

    let people = match &outcome {
        MultiPoolOutcome::Planned { solutions } => directory(&snapshot, solutions),
        MultiPoolOutcome::Fallback { outcome, .. } => directory(&snapshot, solutions_of(outcome)),
    };
    Ok(Json(MultiPoolResponse { outcome, people }))
}
