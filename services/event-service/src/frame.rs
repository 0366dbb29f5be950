//! Packed little-endian radio frames relayed by base stations.
//!
//! Full frame (23 bytes):
//! `year u16 | month u8 | day u8 | seconds_of_day u32 | type u8 | handheld u8 |
//! tower u8 | lat i32 | lon i32 | status u8 | msg_id u16 | response_code u8`
//!
//! Compact frame (14 bytes), sent by relays that stamp the time themselves:
//! `type u8 | handheld u8 | tower u8 | lat i32 | lon i32 | status u8 | msg_id u16`
//!
//! Coordinates are degrees scaled by 1e7.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::labels::PACKET_RESPONSE;
use crate::models::NewEvent;

pub const FULL_FRAME_LEN: usize = 23;
pub const COMPACT_FRAME_LEN: usize = 14;
pub const ACK_LEN: usize = 3;

const COORD_SCALE: f64 = 1e7;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("frame is {0} bytes, expected 23 or 14")]
    Length(usize),
    #[error("frame timestamp {year:04}-{month:02}-{day:02} +{seconds}s is not a valid time")]
    Timestamp {
        year: u16,
        month: u8,
        day: u8,
        seconds: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub sent_at: Option<DateTime<Utc>>,
    pub kind: u8,
    pub handheld_id: u8,
    pub tower_id: u8,
    pub lat: i32,
    pub lon: i32,
    pub status: u8,
    pub msg_id: u16,
    pub response_code: Option<u8>,
}

impl Frame {
    pub fn decode(raw: &[u8]) -> Result<Self, FrameError> {
        match raw.len() {
            FULL_FRAME_LEN => {
                let mut reader = Reader::new(raw);
                let year = reader.u16();
                let month = reader.u8();
                let day = reader.u8();
                let seconds = reader.u32();
                let sent_at = frame_time(year, month, day, seconds)?;
                let mut frame = Self::decode_body(&mut reader);
                frame.sent_at = Some(sent_at);
                frame.response_code = Some(reader.u8());
                Ok(frame)
            }
            COMPACT_FRAME_LEN => Ok(Self::decode_body(&mut Reader::new(raw))),
            other => Err(FrameError::Length(other)),
        }
    }

    fn decode_body(reader: &mut Reader<'_>) -> Self {
        Self {
            sent_at: None,
            kind: reader.u8(),
            handheld_id: reader.u8(),
            tower_id: reader.u8(),
            lat: reader.i32(),
            lon: reader.i32(),
            status: reader.u8(),
            msg_id: reader.u16(),
            response_code: None,
        }
    }

    /// Acknowledgement the relay hands back to the tower.
    pub fn ack(&self) -> [u8; ACK_LEN] {
        let [lo, hi] = self.msg_id.to_le_bytes();
        [1, lo, hi]
    }

    pub fn into_new_event(self) -> NewEvent {
        // Only response packets carry a meaningful response code.
        let response_code = self
            .response_code
            .filter(|_| i32::from(self.kind) == PACKET_RESPONSE)
            .map(i32::from);
        NewEvent {
            kind: Some(i32::from(self.kind)),
            handheld_id: Some(i32::from(self.handheld_id)),
            tower_id: Some(i32::from(self.tower_id)),
            lat: Some(f64::from(self.lat) / COORD_SCALE),
            lon: Some(f64::from(self.lon) / COORD_SCALE),
            status: Some(i32::from(self.status)),
            msg_id: Some(i32::from(self.msg_id)),
            response_code,
            response_bool: response_code.map(|code| code != 0),
            created_at: self.sent_at,
            ..NewEvent::default()
        }
    }
}

fn frame_time(year: u16, month: u8, day: u8, seconds: u32) -> Result<DateTime<Utc>, FrameError> {
    let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day));
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0);
    match (date, time) {
        (Some(date), Some(time)) => Ok(date.and_time(time).and_utc()),
        _ => Err(FrameError::Timestamp {
            year,
            month,
            day,
            seconds,
        }),
    }
}

/// Cursor over a buffer whose length was checked up front.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn full_frame(kind: u8, msg_id: u16, response_code: u8) -> Vec<u8> {
        let mut raw = Vec::with_capacity(FULL_FRAME_LEN);
        raw.extend_from_slice(&2025u16.to_le_bytes());
        raw.push(6);
        raw.push(1);
        raw.extend_from_slice(&36_000u32.to_le_bytes());
        raw.extend_from_slice(&[kind, 42, 7]);
        raw.extend_from_slice(&100_000_000i32.to_le_bytes());
        raw.extend_from_slice(&(-200_000_000i32).to_le_bytes());
        raw.push(1);
        raw.extend_from_slice(&msg_id.to_le_bytes());
        raw.push(response_code);
        raw
    }

    pub(crate) fn compact_frame(msg_id: u16) -> Vec<u8> {
        let mut raw = full_frame(1, msg_id, 0);
        raw.drain(..8);
        raw.pop();
        raw
    }

    #[test]
    fn decodes_full_frame() {
        let frame = Frame::decode(&full_frame(1, 513, 0)).unwrap();
        assert_eq!(
            frame.sent_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).single()
        );
        assert_eq!(frame.kind, 1);
        assert_eq!(frame.handheld_id, 42);
        assert_eq!(frame.tower_id, 7);
        assert_eq!(frame.lat, 100_000_000);
        assert_eq!(frame.lon, -200_000_000);
        assert_eq!(frame.msg_id, 513);
        assert_eq!(frame.response_code, Some(0));
    }

    #[test]
    fn compact_frame_has_no_timestamp() {
        let raw = compact_frame(9);
        assert_eq!(raw.len(), COMPACT_FRAME_LEN);
        let frame = Frame::decode(&raw).unwrap();
        assert_eq!(frame.sent_at, None);
        assert_eq!(frame.handheld_id, 42);
        assert_eq!(frame.msg_id, 9);
    }

    #[test]
    fn rejects_unexpected_length() {
        assert_eq!(Frame::decode(&[0u8; 10]), Err(FrameError::Length(10)));
        assert_eq!(Frame::decode(&[]), Err(FrameError::Length(0)));
    }

    #[test]
    fn rejects_impossible_timestamp() {
        let mut raw = full_frame(1, 1, 0);
        raw[2] = 13;
        assert!(matches!(
            Frame::decode(&raw),
            Err(FrameError::Timestamp { month: 13, .. })
        ));

        let mut raw = full_frame(1, 1, 0);
        raw[4..8].copy_from_slice(&86_400u32.to_le_bytes());
        assert!(matches!(
            Frame::decode(&raw),
            Err(FrameError::Timestamp { seconds: 86_400, .. })
        ));
    }

    #[test]
    fn ack_carries_message_id() {
        let frame = Frame::decode(&full_frame(1, 0x0201, 0)).unwrap();
        assert_eq!(frame.ack(), [1, 0x01, 0x02]);
    }

    #[test]
    fn status_frame_maps_to_event_without_response() {
        let event = Frame::decode(&full_frame(1, 5, 1)).unwrap().into_new_event();
        assert_eq!(event.kind, Some(1));
        assert_eq!(event.lat, Some(10.0));
        assert_eq!(event.lon, Some(-20.0));
        assert_eq!(event.response_code, None);
        assert_eq!(event.response_bool, None);
        assert!(event.created_at.is_some());
    }

    #[test]
    fn response_frame_sets_response_fields() {
        let event = Frame::decode(&full_frame(2, 5, 1)).unwrap().into_new_event();
        assert_eq!(event.response_code, Some(1));
        assert_eq!(event.response_bool, Some(true));
    }
}
