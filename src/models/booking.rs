use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, FieldErrors};

pub type Payload = serde_json::Map<String, Value>;

const STATUS_HELP: &str = "Status must be one of: pending, accepted, rejected, canceled/cancelled";
const TIME_HELP: &str = "time_booked must be an ISO-8601 datetime string";

#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub client_id: i64,
    pub service_id: i64,
    pub provider_id: i64,
    pub status: BookingStatus,
    pub time_booked: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    // Only the two parties of a booking may change or remove it.
    pub fn is_party(&self, user_id: i64) -> bool {
        user_id == self.client_id || user_id == self.provider_id
    }
}

// Both spellings of "canceled" are accepted and kept as given.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Canceled,
    Cancelled,
}

impl BookingStatus {
    // Statuses that hold a slot on the provider's calendar.
    pub const OCCUPYING: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Accepted];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Canceled => "canceled",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "accepted" => Some(BookingStatus::Accepted),
            "rejected" => Some(BookingStatus::Rejected),
            "canceled" => Some(BookingStatus::Canceled),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

// Offsets are converted to UTC; values without an offset are taken to
// already be UTC. Sub-second digits past microseconds are dropped, matching
// what the store keeps.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    parse_iso8601(raw.trim()).map(|dt| dt.trunc_subsecs(6))
}

fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = raw.replace('Z', "+00:00");
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%d %H:%M%:z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub service_id: i64,
    pub time_booked: DateTime<Utc>,
    pub status: BookingStatus,
}

impl NewBooking {
    pub fn from_payload(data: &Payload) -> Result<Self, AppError> {
        let mut errors = FieldErrors::new();

        let service_id = match data.get("service_id") {
            None | Some(Value::Null) => {
                errors.insert("service_id".into(), "service_id is required".into());
                None
            }
            Some(value) => {
                let id = as_id(value);
                if id.is_none() {
                    errors.insert("service_id".into(), "service_id must be an integer".into());
                }
                id
            }
        };

        let time_booked = match data.get("time_booked") {
            None | Some(Value::Null) => {
                errors.insert("time_booked".into(), "time_booked is required".into());
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                errors.insert("time_booked".into(), "time_booked is required".into());
                None
            }
            Some(value) => parse_time_field(value, &mut errors),
        };

        let status = match data.get("status") {
            Some(value) => parse_status_field(value, &mut errors),
            None => Some(BookingStatus::Pending),
        };

        match (service_id, time_booked, status) {
            (Some(service_id), Some(time_booked), Some(status)) if errors.is_empty() => {
                Ok(NewBooking {
                    service_id,
                    time_booked,
                    status,
                })
            }
            _ => Err(AppError::validation(errors)),
        }
    }
}

// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub time_booked: Option<DateTime<Utc>>,
}

impl BookingPatch {
    pub fn from_payload(data: &Payload) -> Result<Self, AppError> {
        let mut errors = FieldErrors::new();
        let mut patch = BookingPatch::default();

        if let Some(value) = data.get("status") {
            patch.status = parse_status_field(value, &mut errors);
        }

        // A null or empty time_booked is treated as "not provided".
        match data.get("time_booked") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.trim().is_empty() => {}
            Some(value) => patch.time_booked = parse_time_field(value, &mut errors),
        }

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(AppError::validation(errors))
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub client_id: i64,
    pub provider_id: i64,
    pub service_id: i64,
    pub status: BookingStatus,
    pub time_booked: DateTime<Utc>,
}

fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_status_field(value: &Value, errors: &mut FieldErrors) -> Option<BookingStatus> {
    let status = value.as_str().and_then(BookingStatus::parse);
    if status.is_none() {
        errors.insert("status".into(), STATUS_HELP.into());
    }
    status
}

fn parse_time_field(value: &Value, errors: &mut FieldErrors) -> Option<DateTime<Utc>> {
    let parsed = value.as_str().and_then(parse_instant);
    if parsed.is_none() {
        errors.insert("time_booked".into(), TIME_HELP.into());
    }
    parsed
}
