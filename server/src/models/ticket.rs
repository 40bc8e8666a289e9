use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A priced sub-category of an event with its own seat pool.
///
/// `price` is descriptive; nothing in this service captures payment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketTier {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub capacity: i32,
    pub remaining_capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketTier {
    /// A tier with every seat still available.
    pub fn open(event_id: Uuid, input: &NewTier, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            name: input.name.trim().to_string(),
            price: input.price,
            capacity: input.capacity,
            remaining_capacity: input.capacity,
            created_at,
            updated_at: created_at,
        }
    }

    /// Seats currently held by registrations.
    pub fn held(&self) -> i32 {
        self.capacity - self.remaining_capacity
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTier {
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    pub capacity: i32,
}

/// Partial tier edit. A capacity change moves the remaining seats and the
/// event totals by the same amount and may not drop below seats already
/// held.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TierUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub capacity: Option<i32>,
}

/// The presentable proof of a registration.
///
/// One per registration. A transfer deletes the row and renders a new one so
/// the code and document always name the current holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TicketArtifact {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub ticket_code: String,
    pub qr_payload: String,
    pub document_url: String,
    pub created_at: DateTime<Utc>,
}
