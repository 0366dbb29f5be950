use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::models::{CreateEventResponse, NewEvent};
use crate::service;
use crate::state::AppState;

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    match service::check_ready(&state).await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<NewEvent>,
) -> impl IntoResponse {
    match service::create_event(&state, payload).await {
        Ok(event) => (
            StatusCode::CREATED,
            Json(CreateEventResponse {
                success: true,
                event,
            }),
        )
            .into_response(),
        Err(err) => (err.status, Json(err.body)).into_response(),
    }
}

pub async fn list_events(State(state): State<AppState>) -> impl IntoResponse {
    match service::list_events(&state).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(err) => (err.status, Json(err.body)).into_response(),
    }
}

pub async fn ingest_frame(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match service::ingest_frame(&state, &body).await {
        Ok(ack) => (
            StatusCode::CREATED,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            ack.to_vec(),
        )
            .into_response(),
        Err(err) => (err.status, Json(err.body)).into_response(),
    }
}
