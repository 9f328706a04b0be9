use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Booking, BookingStatus};

// A booking party as embedded in the joined representation. Fields other
// than `id` are empty when the user record no longer exists.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PartySummary {
    pub id: i64,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
}

impl PartySummary {
    pub fn display_name(&self) -> Option<String> {
        self.full_name.clone().or_else(|| self.username.clone())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceSummary {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingView {
    pub id: i64,
    pub client_id: i64,
    pub provider_id: i64,
    pub service_id: i64,
    pub client: PartySummary,
    pub provider: PartySummary,
    pub service: ServiceSummary,
    pub status: BookingStatus,
    pub time_booked: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotView {
    pub booking_id: i64,
    pub service_id: i64,
    pub provider_id: i64,
    pub time_booked: DateTime<Utc>,
    pub status: BookingStatus,
}

impl From<&Booking> for SlotView {
    fn from(b: &Booking) -> Self {
        SlotView {
            booking_id: b.id,
            service_id: b.service_id,
            provider_id: b.provider_id,
            time_booked: b.time_booked,
            status: b.status,
        }
    }
}
