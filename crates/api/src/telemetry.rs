use std::time::Duration;

use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, HttpMakeClassifier};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::Level;

pub const BODY_LIMIT: usize = 2 * 1024 * 1024;
/// Upper bound for a synchronous search; long ones belong on `/v1/jobs`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub type Traced = Stack<TraceLayer<HttpMakeClassifier>, Identity>;

pub type HttpStack =
    ServiceBuilder<Stack<TimeoutLayer, Stack<RequestBodyLimitLayer, Stack<CorsLayer, Traced>>>>;

pub fn stack() -> HttpStack {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));
    let cors = CorsLayer::permissive();
    let limit = RequestBodyLimitLayer::new(BODY_LIMIT);

    ServiceBuilder::new()
        .layer(trace)
        .layer(cors)
        .layer(limit)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}
