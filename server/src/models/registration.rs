use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Registration status.
///
/// `Cancelled` is terminal. The `Rsvp*` values form an attendance-intent axis
/// that a live registration can move along freely, including back to
/// `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
    RsvpYes,
    RsvpNo,
    RsvpMaybe,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::RsvpYes => "rsvp_yes",
            RegistrationStatus::RsvpNo => "rsvp_no",
            RegistrationStatus::RsvpMaybe => "rsvp_maybe",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self == RegistrationStatus::Cancelled
    }

    /// Whether an RSVP update may set this status.
    pub fn is_attendance_intent(&self) -> bool {
        !self.is_cancelled()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub ticket_tier_id: Uuid,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn confirmed(user_id: Uuid, event_id: Uuid, ticket_tier_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            ticket_tier_id,
            status: RegistrationStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A registration joined with the names a ticket holder wants to see.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RegistrationSummary {
    pub id: Uuid,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_start_time: DateTime<Utc>,
    pub ticket_tier_id: Uuid,
    pub tier_name: String,
    pub status: RegistrationStatus,
    pub ticket_code: Option<String>,
}

/// What a ticket code resolves to at the door.
#[derive(Debug, Clone, Serialize)]
pub struct TicketVerification {
    pub ticket_code: String,
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub holder_id: Uuid,
    pub status: RegistrationStatus,
}
