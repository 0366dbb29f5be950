use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coerce;
use crate::labels::{packet_label, status_label};

/// Ingress shape of an event. Fields outside this set are dropped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewEvent {
    #[serde(rename = "type", default, deserialize_with = "coerce::int")]
    pub kind: Option<i32>,
    #[serde(default, deserialize_with = "coerce::text")]
    pub type_str: Option<String>,
    #[serde(default, deserialize_with = "coerce::int")]
    pub handheld_id: Option<i32>,
    #[serde(default, deserialize_with = "coerce::int")]
    pub tower_id: Option<i32>,
    #[serde(default, deserialize_with = "coerce::float")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "coerce::float")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "coerce::int")]
    pub status: Option<i32>,
    #[serde(default, deserialize_with = "coerce::text")]
    pub status_str: Option<String>,
    #[serde(default, deserialize_with = "coerce::int")]
    pub msg_id: Option<i32>,
    #[serde(default, deserialize_with = "coerce::int")]
    pub response_code: Option<i32>,
    #[serde(default, deserialize_with = "coerce::boolean")]
    pub response_bool: Option<bool>,
    #[serde(default, deserialize_with = "coerce::text")]
    pub latency_ms: Option<String>,
    #[serde(rename = "createdAt", default, deserialize_with = "coerce::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewEvent {
    /// Fills absent labels from their codes; supplied labels win.
    pub fn with_labels(mut self) -> Self {
        if self.status_str.is_none() {
            self.status_str = self.status.map(|code| status_label(code).to_string());
        }
        if self.type_str.is_none() {
            self.type_str = self.kind.map(|code| packet_label(code).to_string());
        }
        self
    }

    pub fn into_event(self, id: Uuid, now: DateTime<Utc>) -> Event {
        Event {
            id,
            kind: self.kind,
            type_str: self.type_str,
            handheld_id: self.handheld_id,
            tower_id: self.tower_id,
            lat: self.lat,
            lon: self.lon,
            status: self.status,
            status_str: self.status_str,
            msg_id: self.msg_id,
            response_code: self.response_code,
            response_bool: self.response_bool,
            latency_ms: self.latency_ms,
            created_at: self.created_at.unwrap_or(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handheld_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tower_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_bool: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CreateEventResponse {
    pub success: bool,
    pub event: Event,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}
