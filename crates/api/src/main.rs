mod config;
mod dataset;
mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod admin;
    pub mod batches;
    pub mod conflicts;
    pub mod health;
    pub mod jobs;
    pub mod slots;
}

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::slots::list,
            routes::slots::free_rooms,
            routes::conflicts::check,
            routes::batches::find,
            routes::batches::find_multi,
            routes::jobs::create,
            routes::jobs::status,
            routes::admin::reload,
        ),
        components(schemas(
            types::DayOfWeek, types::Slot, types::PersonId, types::RoomId, types::SubjectId,
            types::DivisionId, types::ClassRef, types::PersonSummary, types::Batch,
            types::Solution, types::MoreBatches, types::Suggestions, types::Outcome,
            types::MultiPoolOutcome, types::TargetSpec, types::SlotFilter, types::BatchRequest,
            types::MultiPoolRequest, types::ConflictRequest, types::BusyDetail,
            types::ConflictReport,
            jobs::JobId, jobs::JobStatus,
            routes::slots::FreeRooms,
            routes::batches::BatchesResponse,
            routes::batches::MultiPoolResponse,
            routes::jobs::JobCreated,
            routes::admin::Reloaded
        )),
        tags(
            (name = "slotsplit", description = "Batch scheduling around a fixed timetable")
        )
    )]
struct ApiDoc;

fn router(app_state: state::AppState) -> Router {
    Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/slots", get(routes::slots::list))
        .route("/v1/rooms/free", get(routes::slots::free_rooms))
        .route("/v1/conflicts", post(routes::conflicts::check))
        .route("/v1/batches", post(routes::batches::find))
        .route("/v1/batches/multi", post(routes::batches::find_multi))
        .route("/v1/jobs", post(routes::jobs::create))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/admin/reload", post(routes::admin::reload))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let settings = config::Settings::from_env().context("reading configuration")?;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    let app_state = state::AppState::load(settings).context("loading dataset")?;
    tracing::info!(people = app_state.snapshot().people_count(), "dataset loaded");

    let app = router(app_state);
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
