use async_trait::async_trait;
use chrono::Utc;
use std::{
    cmp::Reverse,
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Event, NewEvent};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("{op} failed: {reason}")]
    Query { op: &'static str, reason: String },
    #[error("{op} timed out after {elapsed:?}")]
    Timeout { op: &'static str, elapsed: Duration },
    #[error("event store is closed")]
    Closed,
}

impl StorageError {
    pub fn query(op: &'static str, err: impl std::fmt::Display) -> Self {
        StorageError::Query {
            op,
            reason: err.to_string(),
        }
    }
}

/// Persistence for events. The store assigns `id` and owns every record.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: NewEvent) -> Result<Event, StorageError>;

    /// All events, newest `createdAt` first, ties broken by `id` descending.
    async fn list(&self) -> Result<Vec<Event>, StorageError>;

    async fn health_check(&self) -> Result<(), StorageError>;

    async fn close(&self);
}

/// Bounds how long a caller waits on the store. Expiry drops the future but
/// does not cancel a statement already sent to the server; `PgEventStore`
/// relies on the session `statement_timeout` for that.
pub async fn with_timeout<T, F>(
    op: &'static str,
    limit: Duration,
    future: F,
) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout {
            op,
            elapsed: limit,
        }),
    }
}

/// Event store held in process memory, used by tests and local runs.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<Event>>,
    unavailable: AtomicBool,
    closed: AtomicBool,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates losing the backing store without closing it.
    #[cfg(test)]
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn ensure_reachable(&self, op: &'static str) -> Result<(), StorageError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::query(op, "store unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: NewEvent) -> Result<Event, StorageError> {
        self.ensure_reachable("insert event")?;
        let event = event.into_event(Uuid::now_v7(), Utc::now());
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn list(&self) -> Result<Vec<Event>, StorageError> {
        self.ensure_reachable("list events")?;
        let mut events = self.events.read().await.clone();
        events.sort_by_key(|event| Reverse((event.created_at, event.id)));
        Ok(events)
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.ensure_reachable("health check")
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> NewEvent {
        NewEvent {
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).single(),
            ..NewEvent::default()
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = MemoryEventStore::new();
        store.insert(at(9)).await.unwrap();
        store.insert(at(11)).await.unwrap();
        store.insert(at(10)).await.unwrap();

        let hours: Vec<_> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|event| event.created_at.format("%H").to_string())
            .collect();
        assert_eq!(hours, ["11", "10", "09"]);
    }

    #[tokio::test]
    async fn equal_timestamps_order_by_id() {
        let store = MemoryEventStore::new();
        let first = store.insert(at(9)).await.unwrap();
        let second = store.insert(at(9)).await.unwrap();

        let events = store.list().await.unwrap();
        assert_eq!(events[0].id, second.id.max(first.id));
        assert_eq!(events[1].id, second.id.min(first.id));
    }

    #[tokio::test]
    async fn same_payload_twice_creates_two_records() {
        let store = MemoryEventStore::new();
        let payload = NewEvent {
            handheld_id: Some(42),
            ..NewEvent::default()
        };
        let first = store.insert(payload.clone()).await.unwrap();
        let second = store.insert(payload).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.events.read().await.len(), 2);
    }

    #[tokio::test]
    async fn unavailable_store_rejects_writes() {
        let store = MemoryEventStore::new();
        store.set_available(false);
        assert!(matches!(
            store.insert(NewEvent::default()).await,
            Err(StorageError::Query { .. })
        ));
        assert!(store.health_check().await.is_err());

        store.set_available(true);
        assert_eq!(store.events.read().await.len(), 0);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn closed_store_fails_every_operation() {
        let store = MemoryEventStore::new();
        store.close().await;
        assert!(matches!(store.list().await, Err(StorageError::Closed)));
        assert!(matches!(store.health_check().await, Err(StorageError::Closed)));
    }

    #[tokio::test]
    async fn stalled_operation_times_out() {
        let stalled = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, StorageError>(())
        };
        let result = with_timeout("list events", Duration::from_millis(10), stalled).await;
        assert!(matches!(
            result,
            Err(StorageError::Timeout { op: "list events", .. })
        ));
    }
}
