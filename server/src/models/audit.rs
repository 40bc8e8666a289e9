use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const ACTION_CREATE_REGISTRATION: &str = "CREATE_REGISTRATION";
pub const ACTION_CANCEL_REGISTRATION: &str = "CANCEL_REGISTRATION";
pub const ACTION_TRANSFER_TICKET: &str = "TRANSFER_TICKET";
pub const ACTION_UPDATE_RSVP: &str = "UPDATE_RSVP";
pub const ACTION_CANCEL_EVENT: &str = "CANCEL_EVENT";
pub const ACTION_CREATE_EVENT: &str = "CREATE_EVENT";
pub const ACTION_UPDATE_EVENT: &str = "UPDATE_EVENT";
pub const ACTION_CREATE_TIER: &str = "CREATE_TIER";
pub const ACTION_UPDATE_TIER: &str = "UPDATE_TIER";

/// Append-only record of a state change, written inside the transaction that
/// made the change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub before: Value,
    pub after: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(actor_id: Uuid, action: &str, entity_type: &str, entity_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            before: Value::Object(Default::default()),
            after: Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn with_before(mut self, before: Value) -> Self {
        self.before = before;
        self
    }

    pub fn with_after(mut self, after: Value) -> Self {
        self.after = after;
        self
    }
}
