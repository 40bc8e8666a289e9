use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ticket::{NewTier, TicketTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

/// An event and its aggregate seat counters.
///
/// `remaining_capacity` is stored, not summed from tiers on read. The
/// reservation engine moves it in the same transaction as the tier counter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: EventStatus,
    pub start_time: DateTime<Utc>,
    pub total_capacity: i32,
    pub remaining_capacity: i32,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_published(&self) -> bool {
        self.status == EventStatus::Published
    }
}

/// An event with its tiers in listing order.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub tiers: Vec<TicketTier>,
}

/// Admin input for a new event. Capacity is the sum of the tier capacities.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    /// `draft` when omitted. New events cannot start out cancelled.
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub tiers: Vec<NewTier>,
}

/// Partial admin edit. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub status: Option<EventStatus>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.status.is_none()
    }
}

/// Remaining seats for an event, broken down per tier.
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub event_id: Uuid,
    pub status: EventStatus,
    pub total_capacity: i32,
    pub remaining_capacity: i32,
    pub tiers: Vec<TierAvailability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierAvailability {
    pub tier_id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub remaining_capacity: i32,
}
