use axum::http::StatusCode;

use crate::frame::{Frame, FrameError, ACK_LEN};
use crate::models::{ErrorResponse, Event, NewEvent};
use crate::state::AppState;
use crate::store::{with_timeout, StorageError};

pub struct ServiceError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ServiceError {
    pub fn new(status: StatusCode, code: &'static str, message: String) -> Self {
        Self {
            status,
            body: ErrorResponse { code, message },
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        // Store details stay in the logs.
        tracing::error!(error = %err, "event store failure");
        let code = match err {
            StorageError::Timeout { .. } => "storage_timeout",
            _ => "storage_error",
        };
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            code,
            "event store unavailable".to_string(),
        )
    }
}

impl From<FrameError> for ServiceError {
    fn from(err: FrameError) -> Self {
        tracing::warn!(error = %err, "rejected frame");
        Self::new(StatusCode::BAD_REQUEST, "invalid_frame", err.to_string())
    }
}

pub async fn create_event(state: &AppState, payload: NewEvent) -> Result<Event, ServiceError> {
    let event = with_timeout(
        "insert event",
        state.store_timeout,
        state.store.insert(payload.with_labels()),
    )
    .await?;

    tracing::info!(
        event_id = %event.id,
        kind = ?event.kind,
        handheld_id = ?event.handheld_id,
        tower_id = ?event.tower_id,
        msg_id = ?event.msg_id,
        status = ?event.status,
        "event stored"
    );
    Ok(event)
}

pub async fn list_events(state: &AppState) -> Result<Vec<Event>, ServiceError> {
    let events = with_timeout("list events", state.store_timeout, state.store.list()).await?;
    tracing::debug!(count = events.len(), "events listed");
    Ok(events)
}

pub async fn ingest_frame(state: &AppState, raw: &[u8]) -> Result<[u8; ACK_LEN], ServiceError> {
    let frame = Frame::decode(raw)?;
    let ack = frame.ack();
    create_event(state, frame.into_new_event()).await?;
    Ok(ack)
}

pub async fn check_ready(state: &AppState) -> Result<(), StorageError> {
    with_timeout("health check", state.store_timeout, state.store.health_check()).await
}
