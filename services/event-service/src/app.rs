use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{create_event, healthz, ingest_frame, list_events, readyz};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/events", post(create_event).get(list_events))
        .route("/api/frames", post(ingest_frame))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
