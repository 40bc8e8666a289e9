use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A confirmed holder of a ticket for one event.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Attendee {
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}
