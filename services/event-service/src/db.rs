use async_trait::async_trait;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, Config, NoTls, Row};
use uuid::Uuid;

use crate::models::{Event, NewEvent};
use crate::store::{EventStore, StorageError};

const SQL_ENSURE_TABLE: &str = "CREATE TABLE IF NOT EXISTS events (\
id UUID PRIMARY KEY, \
\"type\" INTEGER, \
type_str TEXT, \
handheld_id INTEGER, \
tower_id INTEGER, \
lat DOUBLE PRECISION, \
lon DOUBLE PRECISION, \
status INTEGER, \
status_str TEXT, \
msg_id INTEGER, \
response_code INTEGER, \
response_bool BOOLEAN, \
latency_ms TEXT, \
created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()\
); \
CREATE INDEX IF NOT EXISTS events_recent_idx ON events (created_at DESC, id DESC)";
const SQL_INSERT_EVENT: &str = "INSERT INTO events \
(id, \"type\", type_str, handheld_id, tower_id, lat, lon, status, status_str, msg_id, \
response_code, response_bool, latency_ms, created_at) \
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, COALESCE($14, NOW())) \
RETURNING id, \"type\", type_str, handheld_id, tower_id, lat, lon, status, status_str, msg_id, \
response_code, response_bool, latency_ms, created_at";
const SQL_LIST_EVENTS: &str = "SELECT id, \"type\", type_str, handheld_id, tower_id, lat, lon, \
status, status_str, msg_id, response_code, response_bool, latency_ms, created_at \
FROM events ORDER BY created_at DESC, id DESC";
const SQL_PING: &str = "SELECT 1";

/// Event store backed by a single PostgreSQL session.
pub struct PgEventStore {
    client: Client,
    driver: JoinHandle<()>,
    closed: AtomicBool,
}

impl PgEventStore {
    pub async fn open(
        database_url: &str,
        statement_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let config = database_url
            .parse::<Config>()
            .map_err(|err| StorageError::Connect(err.to_string()))?;
        Self::connect(&config, statement_timeout).await
    }

    /// Statements running past `statement_timeout` are cancelled and rolled
    /// back by the server, so a request that timed out client-side does not
    /// leave a late commit behind.
    pub async fn connect(
        config: &Config,
        statement_timeout: Duration,
    ) -> Result<Self, StorageError> {
        tracing::info!(state = "connecting", "opening event store");
        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|err| StorageError::Connect(err.to_string()))?;
        let driver = tokio::spawn(async move {
            // Drive the connection in the background.
            if let Err(err) = connection.await {
                tracing::error!(error = %err, "database connection error");
            }
        });

        let setup = format!(
            "SET statement_timeout = {}; {SQL_ENSURE_TABLE}",
            statement_timeout.as_millis()
        );
        if let Err(err) = client.batch_execute(&setup).await {
            driver.abort();
            return Err(StorageError::query("prepare event store", err));
        }

        tracing::info!(
            state = "connected",
            statement_timeout_ms = statement_timeout.as_millis() as u64,
            "event store connected"
        );
        Ok(Self {
            client,
            driver,
            closed: AtomicBool::new(false),
        })
    }

    fn live_client(&self) -> Result<&Client, StorageError> {
        if self.closed.load(Ordering::SeqCst) || self.client.is_closed() {
            return Err(StorageError::Closed);
        }
        Ok(&self.client)
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: NewEvent) -> Result<Event, StorageError> {
        let client = self.live_client()?;
        let id = Uuid::now_v7();
        let row = client
            .query_one(
                SQL_INSERT_EVENT,
                &[
                    &id,
                    &event.kind,
                    &event.type_str,
                    &event.handheld_id,
                    &event.tower_id,
                    &event.lat,
                    &event.lon,
                    &event.status,
                    &event.status_str,
                    &event.msg_id,
                    &event.response_code,
                    &event.response_bool,
                    &event.latency_ms,
                    &event.created_at,
                ],
            )
            .await
            .map_err(|err| StorageError::query("insert event", err))?;
        event_from_row(&row)
    }

    async fn list(&self) -> Result<Vec<Event>, StorageError> {
        let client = self.live_client()?;
        let rows = client
            .query(SQL_LIST_EVENTS, &[])
            .await
            .map_err(|err| StorageError::query("list events", err))?;
        rows.iter().map(event_from_row).collect()
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.live_client()?
            .query_one(SQL_PING, &[])
            .await
            .map_err(|err| StorageError::query("health check", err))?;
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.driver.abort();
            tracing::info!(state = "disconnected", "event store closed");
        }
    }
}

/// Fails instead of panicking when an existing table has drifted column types.
fn event_from_row(row: &Row) -> Result<Event, StorageError> {
    decode_row(row).map_err(|err| StorageError::query("decode event", err))
}

fn decode_row(row: &Row) -> Result<Event, tokio_postgres::Error> {
    Ok(Event {
        id: row.try_get("id")?,
        kind: row.try_get("type")?,
        type_str: row.try_get("type_str")?,
        handheld_id: row.try_get("handheld_id")?,
        tower_id: row.try_get("tower_id")?,
        lat: row.try_get("lat")?,
        lon: row.try_get("lon")?,
        status: row.try_get("status")?,
        status_str: row.try_get("status_str")?,
        msg_id: row.try_get("msg_id")?,
        response_code: row.try_get("response_code")?,
        response_bool: row.try_get("response_bool")?,
        latency_ms: row.try_get("latency_ms")?,
        created_at: row.try_get("created_at")?,
    })
}
